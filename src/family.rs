//
// family.rs: Device family parameterisation
//
// The only decision xilbuild makes about a target is which flow to
// run: CPLDs go through the fitter and come out as a JEDEC file,
// FPGAs are mapped, placed and routed and come out as a bitstream.
// The family table exists to describe the common targets to users.
//

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Flow {
    Cpld,
    Fpga,
}

impl Flow {
    // Anything that doesn't look like an FPGA is handed to the CPLD
    // fitter, which will pick the smallest device in a family if only
    // the family is named.
    pub fn for_target(target: &str) -> Flow {
        let target = target.to_lowercase();
        if target.starts_with("xc3s") || target.starts_with("xc2v") || target.contains("spartan") {
            Flow::Fpga
        } else {
            Flow::Cpld
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flow::Cpld => "CPLD",
            Flow::Fpga => "FPGA",
        })
    }
}

// 'Family' describes one of the commonly targeted device families.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Family {
    Xpla3,
    CoolRunner2,
    Xc9500,
    Spartan3e,
}

struct FamilyData {
    // Family name as accepted by the tools.
    family: &'static str,
    // Human-readable name.
    name: &'static str,
    // Device name prefix used to recognise members of the family.
    prefix: &'static str,
    flow: Flow,
    examples: &'static [&'static str],
}

const XPLA3_DATA: FamilyData = FamilyData {
    family: "xpla3",
    name: "CoolRunner XPLA3",
    prefix: "xcr3",
    flow: Flow::Cpld,
    examples: &["xcr3032xl-r-PC44"],
};

const COOLRUNNER2_DATA: FamilyData = FamilyData {
    family: "acr2",
    name: "CoolRunner2",
    prefix: "xc2c",
    flow: Flow::Cpld,
    examples: &["xc2c32a-6-vq44", "xc2c256-6-tq144", "xc2c256-10-tq144"],
};

const XC9500_DATA: FamilyData = FamilyData {
    family: "xc9500",
    name: "XC9500",
    prefix: "xc95",
    flow: Flow::Cpld,
    examples: &["xc9536-5-pc44", "xc9572-10-pc44", "xc95108-10-pc84", "xc95216-12-pq160"],
};

const SPARTAN3E_DATA: FamilyData = FamilyData {
    family: "spartan3e",
    name: "Spartan3e",
    prefix: "xc3s",
    flow: Flow::Fpga,
    examples: &["xc3s500e-pq208-5", "xc3s250e-pq208-5"],
};

pub const ALL_FAMILIES: [Family; 4] = [
    Family::Xpla3,
    Family::CoolRunner2,
    Family::Xc9500,
    Family::Spartan3e,
];

impl Family {
    // Recognise either a family name or a specific device.
    pub fn from_target(target: &str) -> Option<Family> {
        let target = target.to_lowercase();
        ALL_FAMILIES.iter().copied().find(|fam| {
            let data = fam.get_family_data();
            target == data.family || target.starts_with(data.prefix)
        })
    }

    fn get_family_data(&self) -> &FamilyData {
        match self {
            Family::Xpla3 => &XPLA3_DATA,
            Family::CoolRunner2 => &COOLRUNNER2_DATA,
            Family::Xc9500 => &XC9500_DATA,
            Family::Spartan3e => &SPARTAN3E_DATA,
        }
    }

    pub fn family(&self) -> &str {
        self.get_family_data().family
    }

    pub fn name(&self) -> &str {
        self.get_family_data().name
    }

    pub fn flow(&self) -> Flow {
        self.get_family_data().flow
    }

    pub fn examples(&self) -> &[&'static str] {
        self.get_family_data().examples
    }
}

// The XC9500 fitter takes a few extra options. Targets ending in "100"
// are left alone.
pub fn wants_xc9500_options(target: &str) -> bool {
    target.starts_with("xc95") && !target.ends_with("100")
}

////////////////////////////////////////////////////////////////////////
// Help text listing the common targets.
//

pub fn targets_help() -> String {
    let mut buf = String::from("COMMON TARGETS\n\n");
    buf.push_str(&format!(
        "    {:<8} {:<12} {:<19} {}\n",
        "Type", "Family", "Name", "Example Device Name"
    ));
    for fam in ALL_FAMILIES.iter() {
        let family = match fam.flow() {
            Flow::Fpga => format!("{}(*)", fam.family()),
            Flow::Cpld => fam.family().to_string(),
        };
        buf.push_str(&format!(
            "    {:<8} {:<12} {:<19} {}\n",
            fam.flow().to_string(),
            family,
            fam.name(),
            fam.examples().join(", ")
        ));
    }
    buf.push_str(
        "\n(*) FPGA targets need a specific device rather than the generic family, or\n\
         mapping will fail. The CPLD fitter picks the smallest device in a family.\n",
    );
    buf
}
