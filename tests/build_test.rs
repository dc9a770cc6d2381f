//
// build_test.rs: Drive the xilbuild binary end to end.
//
// The Xilinx tools obviously aren't available here, so the dry-run
// tests check the scripts xilbuild leaves behind, and the execution
// tests point a toolchain file at a directory of stand-in tools that
// record their invocations.
//

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;
use test_bin::get_test_bin;

const CPLD_TOOLS: [&str; 6] = ["xst", "ngdbuild", "cpldfit", "tsim", "taengine", "hprep6"];
const FPGA_TOOLS: [&str; 7] = ["xst", "ngdbuild", "map", "par", "trce", "bitgen", "promgen"];

fn make_sources(dir: &Path) -> Result<()> {
    fs::write(dir.join("lfsr10.v"), "module lfsr10(input clk, output q); endmodule\n")?;
    fs::write(dir.join("taps.vhd"), "entity taps is end taps;\n")?;
    fs::write(dir.join(".#lfsr10.v"), "")?;
    fs::write(dir.join("notes.txt"), "not hdl\n")?;
    Ok(())
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("reading {}: {}", path.as_ref().display(), e))
}

fn check_invocation_succeeded(name: &str, res: &std::process::Output) {
    assert!(
        res.status.success(),
        "'{}' did not succeed: {}",
        name,
        String::from_utf8_lossy(&res.stderr)
    );
}

fn file_mode(path: &Path) -> u32 {
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o7777)
        .unwrap_or(0)
}

// Stand-in tools that append their name to calls.log, print a marker
// on stdout, and fail if named in 'failing'.
fn make_fake_tools(root: &Path, tools: &[&str], failing: &[&str]) -> Result<()> {
    let bin = root.join("bin");
    fs::create_dir(&bin)?;
    let calls = root.join("calls.log");
    for tool in tools {
        let status = if failing.contains(tool) { 1 } else { 0 };
        let path = bin.join(tool);
        fs::write(
            &path,
            format!(
                "#!/bin/sh\necho \"{} $*\" >> \"{}\"\necho TOOLOUT-{}\nexit {}\n",
                tool,
                calls.display(),
                tool,
                status
            ),
        )?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }
    fs::write(
        root.join("toolchain.toml"),
        format!(
            "[env]\nPATH = \"{}:/usr/bin:/bin\"\nXILINX = \"/opt/Xilinx\"\n",
            bin.display()
        ),
    )?;
    Ok(())
}

fn called_tools(root: &Path) -> Vec<String> {
    read(root.join("calls.log"))
        .lines()
        .map(|l| l.split_whitespace().next().unwrap_or("").to_string())
        .collect()
}

#[test]
fn test_cpld_dry_run() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-d", "build", "-n"])
        .args(["-a", "cpldfit: -pterms 10 -inputs 10"])
        .output()?;
    check_invocation_succeeded("cpld dry run", &res);

    let build = tmp.path().join("build");
    assert!(build.join("tmp").is_dir());
    assert!(build.join("xst").is_dir());
    assert_eq!(read(build.join("lfsr10.lso")), "work\n");

    let src = tmp.path().canonicalize()?;
    assert_eq!(
        read(build.join("lfsr10.prj")),
        format!(
            "verilog work {}\nvhdl work {}\n",
            src.join("lfsr10.v").display(),
            src.join("taps.vhd").display()
        )
    );

    let xst = read(build.join("lfsr10.xst"));
    assert!(xst.contains("run -ifn lfsr10.prj -p xc9500 "));
    assert!(xst.contains("-pld_mp YES"));

    for step in &["xst", "ngdbuild", "cpldfit", "sta", "create_jedec"] {
        let script = build.join(format!("run_{}_lfsr10.sh", step));
        assert_eq!(file_mode(&script), 0o777, "{} mode", script.display());
        assert!(read(&script).starts_with("#!/bin/sh\n"));
    }
    assert!(!build.join("run_fpgapnr_lfsr10.sh").exists());
    assert!(!build.join("run_create_netlist_lfsr10.sh").exists());

    let fit = read(build.join("run_cpldfit_lfsr10.sh"));
    assert!(fit.contains("-optimize density \\\n"));
    assert!(fit.contains("-unused float \\\n"));
    assert!(fit.ends_with("lfsr10.ngd -pterms 10 -inputs 10\n"));

    Ok(())
}

#[test]
fn test_fpga_dry_run_with_project_and_constraints() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    fs::write(tmp.path().join("cpu16.prj"), "verilog work cpu16.v\n")?;
    fs::write(tmp.path().join("cpu16.ucf"), "NET clk LOC = P80;\n")?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["--module", "cpu16", "--target", "XC3S500E-PQ208-5"])
        .args(["--project", "cpu16.prj", "--constraints", "cpu16.ucf"])
        .args(["--optimize", "speed", "--dir", "out", "--keephierarchy", "--no-execute"])
        .output()?;
    check_invocation_succeeded("fpga dry run", &res);

    let out = tmp.path().join("out");
    assert!(!out.join("cpu16.prj").exists());

    let xst = read(out.join("cpu16.xst"));
    assert!(xst.contains("-p xc3s500e-pq208-5 "));
    assert!(xst.contains("-opt_mode speed"));
    assert!(xst.contains("-keep_hierarchy Yes"));
    assert!(xst.contains("cpu16.prj -p"));
    assert!(!xst.contains("-pld_mp"));

    let ngdbuild = read(out.join("run_ngdbuild_cpu16.sh"));
    assert!(ngdbuild.contains(" -uc /"));
    assert!(ngdbuild.contains("cpu16.ucf cpu16.ngc cpu16.ngd"));

    let pnr = read(out.join("run_fpgapnr_cpu16.sh"));
    assert!(pnr.contains("map -p xc3s500e-pq208-5 -cm speed "));
    assert!(pnr.contains("\npar -w -ol std -t 1 cpu16_map.ncd cpu16.ncd cpu16.pcf\n"));

    assert!(read(out.join("run_sta_cpu16.sh")).contains("trce -v 3 -s 5 -fastpaths"));
    assert!(read(out.join("run_create_jedec_cpu16.sh")).contains("promgen -w -spi"));
    assert!(read(out.join("run_create_netlist_cpu16.sh")).contains("netgen -w -ofmt verilog"));
    assert!(!out.join("run_cpldfit_cpu16.sh").exists());

    Ok(())
}

#[test]
fn test_cpld_flow_runs_tools_in_order() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    make_fake_tools(tmp.path(), &CPLD_TOOLS, &[])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-t", "xc2c256-10-tq144", "-d", "build"])
        .args(["--toolchain", "toolchain.toml"])
        .output()?;
    check_invocation_succeeded("cpld flow", &res);

    assert_eq!(called_tools(tmp.path()), CPLD_TOOLS.to_vec());
    Ok(())
}

#[test]
fn test_fpga_flow_runs_tools_in_order() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    let mut tools = FPGA_TOOLS.to_vec();
    tools.push("netgen");
    make_fake_tools(tmp.path(), &tools, &[])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "cpu16", "-t", "xc3s250e-pq208-5", "-d", "build"])
        .args(["-a", "netgen: -sim"])
        .args(["--toolchain", "toolchain.toml"])
        .output()?;
    check_invocation_succeeded("fpga flow", &res);

    assert_eq!(called_tools(tmp.path()), tools);
    assert!(read(tmp.path().join("calls.log")).contains("netgen -w -ofmt verilog -aka cpu16_map.ncd -sim\n"));
    Ok(())
}

#[test]
fn test_failing_step_stops_the_build() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    make_fake_tools(tmp.path(), &CPLD_TOOLS, &["cpldfit"])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .env_remove("XILBUILD_LOG")
        .args(["-m", "lfsr10", "-d", "build", "--toolchain", "toolchain.toml"])
        .output()?;

    assert_eq!(res.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&res.stderr);
    assert!(stderr.contains("Error in cpldfit stage"), "{}", stderr);
    assert!(stderr.ends_with("ERROR - completed with errors, check log files\n"), "{}", stderr);
    assert_eq!(called_tools(tmp.path()), vec!["xst", "ngdbuild", "cpldfit"]);
    assert!(!tmp.path().join("build/run_sta_lfsr10.sh").exists());
    Ok(())
}

#[test]
fn test_failure_reported_with_logging_off() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    make_fake_tools(tmp.path(), &CPLD_TOOLS, &["xst"])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .env("XILBUILD_LOG", "off")
        .args(["-m", "lfsr10", "-d", "build", "--toolchain", "toolchain.toml"])
        .output()?;

    assert_eq!(res.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&res.stderr),
        "ERROR - completed with errors, check log files\n"
    );
    Ok(())
}

#[test]
fn test_verbose_shows_tool_output() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    make_fake_tools(tmp.path(), &CPLD_TOOLS, &[])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-d", "build", "-v", "--toolchain", "toolchain.toml"])
        .output()?;
    check_invocation_succeeded("verbose", &res);

    let stdout = String::from_utf8_lossy(&res.stdout);
    for tool in CPLD_TOOLS.iter() {
        assert!(stdout.contains(&format!("TOOLOUT-{}\n", tool)), "{}", stdout);
    }
    Ok(())
}

#[test]
fn test_quiet_hides_tool_output() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    make_fake_tools(tmp.path(), &CPLD_TOOLS, &[])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .env_remove("XILBUILD_LOG")
        .args(["-m", "lfsr10", "-d", "build", "--toolchain", "toolchain.toml"])
        .output()?;
    check_invocation_succeeded("quiet", &res);

    assert!(!String::from_utf8_lossy(&res.stdout).contains("TOOLOUT-"));
    assert!(!String::from_utf8_lossy(&res.stderr).contains("TOOLOUT-"));
    assert_eq!(called_tools(tmp.path()), CPLD_TOOLS.to_vec());
    Ok(())
}

#[test]
fn test_missing_tool_is_reported() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    make_fake_tools(tmp.path(), &["xst"], &[])?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-d", "build", "--toolchain", "toolchain.toml"])
        .output()?;

    assert_eq!(res.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&res.stderr).contains("tool 'ngdbuild' not found"));
    assert_eq!(called_tools(tmp.path()), vec!["xst"]);
    Ok(())
}

#[test]
fn test_fresh_cleans_build_directory() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;
    let build = tmp.path().join("build");
    fs::create_dir_all(build.join("_ngo"))?;
    fs::write(build.join("stale.ngd"), "old")?;
    fs::write(build.join("_ngo/stale.ngo"), "old")?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-d", "build", "-n", "-f"])
        .output()?;
    check_invocation_succeeded("fresh", &res);

    assert!(build.is_dir());
    assert!(!build.join("stale.ngd").exists());
    assert!(!build.join("_ngo").exists());
    assert!(build.join("lfsr10.lso").exists());
    Ok(())
}

#[test]
fn test_default_directory_name() -> Result<()> {
    let tmp = TempDir::new()?;
    make_sources(tmp.path())?;

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-t", "XC9572-10-PC44", "-n"])
        .output()?;
    check_invocation_succeeded("default directory", &res);

    let dirs: Vec<String> = fs::read_dir(tmp.path())?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(dirs.len(), 1);
    assert!(dirs[0].starts_with("lfsr10-xc9572-10-pc44-"), "{}", dirs[0]);
    Ok(())
}

#[test]
fn test_bad_arguments() -> Result<()> {
    let tmp = TempDir::new()?;

    let res = get_test_bin("xilbuild").current_dir(tmp.path()).arg("-n").output()?;
    assert!(!res.status.success(), "missing module accepted");

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-n", "-a", "pterms 10"])
        .output()?;
    assert!(!res.status.success(), "tool args without tool name accepted");

    let res = get_test_bin("xilbuild")
        .current_dir(tmp.path())
        .args(["-m", "lfsr10", "-n", "-o", "power"])
        .output()?;
    assert!(!res.status.success(), "bad optimization goal accepted");

    assert_eq!(fs::read_dir(tmp.path())?.count(), 0);
    Ok(())
}
