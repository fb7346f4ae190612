use sysinfo::System;

/// Display strings describing the machine the benchmark ran on. These
/// replace the machine-specific fields in the report's context block.
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub os: String,
    pub cpu_model: String,
    pub ram_total: String,
}

/// Collects OS, CPU model and total RAM. Platform-specific lookups come
/// first; any failure falls back to generic sysinfo values, never an
/// error.
pub fn collect() -> HostInfo {
    let mut sys = System::new_all();
    sys.refresh_all();

    HostInfo {
        os: platform::os_description().unwrap_or_else(generic_os_description),
        cpu_model: platform::cpu_model().unwrap_or_else(|| generic_cpu_model(&sys)),
        ram_total: platform::ram_total().unwrap_or_else(|| generic_ram_total(&sys)),
    }
}

fn generic_os_description() -> String {
    match (System::name(), System::os_version()) {
        (Some(name), Some(version)) => match System::kernel_version() {
            Some(kernel) => format!("{name} {version} ({kernel})"),
            None => format!("{name} {version}"),
        },
        (Some(name), None) => name,
        _ => "unknown".to_owned(),
    }
}

fn generic_cpu_model(sys: &System) -> String {
    sys.cpus()
        .first()
        .map(|cpu| cpu.brand().trim())
        .filter(|brand| !brand.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| "unknown".to_owned())
}

fn generic_ram_total(sys: &System) -> String {
    match sys.total_memory() {
        0 => "unknown".to_owned(),
        bytes => format_gib(bytes),
    }
}

fn format_gib(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

#[cfg(target_os = "linux")]
mod platform {
    use std::fs;

    use super::{format_gib, parse_mem_total_kb, parse_model_name};

    // The generic sysinfo string already carries distro and kernel info.
    pub fn os_description() -> Option<String> {
        None
    }

    pub fn cpu_model() -> Option<String> {
        parse_model_name(&fs::read_to_string("/proc/cpuinfo").ok()?)
    }

    pub fn ram_total() -> Option<String> {
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        Some(format_gib(parse_mem_total_kb(&meminfo)? * 1024))
    }
}

#[cfg(windows)]
mod platform {
    use std::process::Command;

    use super::format_gib;

    fn wmic_output(args: &[&str]) -> Option<String> {
        let output = Command::new("wmic").args(args).output().ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn field(output: &str, key: &str) -> Option<String> {
        output.lines().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key && !v.trim().is_empty()).then(|| v.trim().to_owned())
        })
    }

    pub fn os_description() -> Option<String> {
        let out = wmic_output(&["os", "get", "Caption,Version", "/value"])?;
        let caption = field(&out, "Caption")?;
        Some(match field(&out, "Version") {
            Some(version) => format!("{caption} ({version})"),
            None => caption,
        })
    }

    pub fn cpu_model() -> Option<String> {
        field(&wmic_output(&["cpu", "get", "Name", "/value"])?, "Name")
    }

    pub fn ram_total() -> Option<String> {
        let out = wmic_output(&["computersystem", "get", "TotalPhysicalMemory", "/value"])?;
        let bytes: u64 = field(&out, "TotalPhysicalMemory")?.parse().ok()?;
        Some(format_gib(bytes))
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::process::Command;

    use super::format_gib;

    fn sysctl(key: &str) -> Option<String> {
        let output = Command::new("sysctl").args(["-n", key]).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        (!value.is_empty()).then_some(value)
    }

    pub fn os_description() -> Option<String> {
        None
    }

    pub fn cpu_model() -> Option<String> {
        sysctl("machdep.cpu.brand_string")
    }

    pub fn ram_total() -> Option<String> {
        Some(format_gib(sysctl("hw.memsize")?.parse().ok()?))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
mod platform {
    pub fn os_description() -> Option<String> {
        None
    }

    pub fn cpu_model() -> Option<String> {
        None
    }

    pub fn ram_total() -> Option<String> {
        None
    }
}

#[cfg(any(target_os = "linux", test))]
fn parse_model_name(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let rest = line.strip_prefix("model name")?;
        let (_, value) = rest.split_once(':')?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    })
}

#[cfg(any(target_os = "linux", test))]
fn parse_mem_total_kb(meminfo: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix("MemTotal:")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_never_returns_empty_strings() {
        let info = collect();
        assert!(!info.os.is_empty());
        assert!(!info.cpu_model.is_empty());
        assert!(!info.ram_total.is_empty());
    }

    #[test]
    fn parses_model_name_from_cpuinfo() {
        let cpuinfo = "processor\t: 0\n\
                       vendor_id\t: GenuineIntel\n\
                       model name\t: Intel(R) Core(TM) i7-9750H CPU @ 2.60GHz\n\
                       model name\t: Intel(R) Core(TM) i7-9750H CPU @ 2.60GHz\n";
        assert_eq!(
            parse_model_name(cpuinfo).as_deref(),
            Some("Intel(R) Core(TM) i7-9750H CPU @ 2.60GHz")
        );
        assert_eq!(parse_model_name("flags\t: fpu vme\n"), None);
    }

    #[test]
    fn parses_mem_total_from_meminfo() {
        let meminfo = "MemTotal:       32658796 kB\nMemFree:        10570080 kB\n";
        assert_eq!(parse_mem_total_kb(meminfo), Some(32658796));
        assert_eq!(parse_mem_total_kb("MemFree: 1 kB\n"), None);
    }

    #[test]
    fn formats_ram_as_gigabytes() {
        assert_eq!(format_gib(32 * 1024 * 1024 * 1024), "32.0 GB");
        assert_eq!(format_gib(16_500_000_000), "15.4 GB");
    }
}
