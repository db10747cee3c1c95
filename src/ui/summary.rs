use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;

use crate::browser::{BrowserStatus, Profile};
use crate::lifecycle::Health;
use crate::status::{GameInfo, HostMetrics};
use crate::ui::format;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn dot(text: &str, ok: Option<bool>, use_color: bool) -> String {
    if !use_color {
        return format!("\u{25cf} {}", text);
    }
    match ok {
        Some(true) => format!("{} {}", "\u{25cf}".green(), text.green()),
        Some(false) => format!("{} {}", "\u{25cf}".red(), text.red()),
        None => format!("{} {}", "\u{25cf}".yellow(), text.yellow()),
    }
}

/// One row per environment.
pub fn status_table(infos: &[GameInfo], use_color: bool) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Environment").set_alignment(CellAlignment::Left),
        Cell::new("Container").set_alignment(CellAlignment::Left),
        Cell::new("Status").set_alignment(CellAlignment::Center),
        Cell::new("Health").set_alignment(CellAlignment::Center),
        Cell::new("Ports").set_alignment(CellAlignment::Left),
        Cell::new("Uptime").set_alignment(CellAlignment::Right),
        Cell::new("URL").set_alignment(CellAlignment::Left),
        Cell::new("Reachable").set_alignment(CellAlignment::Center),
    ]);

    for info in infos {
        let c = &info.container;
        let status = dot(
            &c.status,
            if c.running {
                Some(true)
            } else if c.exists {
                Some(false)
            } else {
                None
            },
            use_color,
        );
        let health = match c.health {
            Health::Healthy => dot("healthy", Some(true), use_color),
            Health::Unhealthy => dot("unhealthy", Some(false), use_color),
            Health::Unknown => "-".to_string(),
        };
        let ports = c.published_ports();
        let ports = if ports.is_empty() {
            "-".to_string()
        } else {
            ports.join(", ")
        };
        let uptime = c
            .uptime
            .map(format::uptime)
            .unwrap_or_else(|| "-".to_string());
        let reachable = if info.reachable {
            dot("yes", Some(true), use_color)
        } else {
            dot("no", Some(false), use_color)
        };

        table.add_row(vec![
            Cell::new(info.environment.title()),
            Cell::new(&c.name),
            Cell::new(&status),
            Cell::new(&health),
            Cell::new(&ports),
            Cell::new(&uptime),
            Cell::new(&info.url),
            Cell::new(&reachable),
        ]);
    }
    table
}

pub fn host_line(metrics: &HostMetrics) -> String {
    let disk = metrics
        .disk_percent
        .map(format::percent)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "CPU {}  Memory {}  Disk {}",
        format::percent(f64::from(metrics.cpu_percent)),
        format::percent(metrics.memory_percent),
        disk
    )
}

pub fn print_status(infos: &[GameInfo], use_color: bool) {
    println!();
    print_table(&status_table(infos, use_color));

    for info in infos {
        if let Some(err) = &info.container_error {
            let line = format!("{}: {}", info.environment.title(), err);
            if use_color {
                println!("  {} {}", "!".yellow(), line.yellow());
            } else {
                println!("  ! {}", line);
            }
        }
    }

    if let Some(host) = infos.iter().find_map(|i| i.host.as_ref()) {
        println!();
        if use_color {
            println!("  {} {}", "Host".bold(), host_line(host));
        } else {
            println!("  Host {}", host_line(host));
        }
    }
    println!();
}

pub fn browser_table(status: &BrowserStatus, use_color: bool) -> Table {
    let mut table = new_table();
    let running = if status.running {
        dot("running", Some(true), use_color)
    } else {
        dot("stopped", Some(false), use_color)
    };
    let debugging = if status.debugging_available {
        format!("http://127.0.0.1:{}", status.port)
    } else {
        "unavailable".to_string()
    };
    let pid = match (&status.external_owner, status.pid) {
        (Some(owner), _) => format!("{} (not started here)", owner),
        (None, Some(pid)) => pid.to_string(),
        (None, None) => "-".to_string(),
    };
    let executable = status
        .executable
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not found".to_string());

    table.add_row(vec![Cell::new("Status"), Cell::new(&running)]);
    table.add_row(vec![Cell::new("PID"), Cell::new(&pid)]);
    table.add_row(vec![Cell::new("Debug port"), Cell::new(status.port)]);
    table.add_row(vec![Cell::new("DevTools"), Cell::new(&debugging)]);
    if let Some(version) = &status.browser_version {
        table.add_row(vec![Cell::new("Browser"), Cell::new(version)]);
    }
    table.add_row(vec![
        Cell::new("Profile"),
        Cell::new(status.active_profile.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Profile path"),
        Cell::new(status.profile_path.display()),
    ]);
    table.add_row(vec![Cell::new("Executable"), Cell::new(&executable)]);
    table
}

pub fn profiles_table(profiles: &[Profile]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Profile").set_alignment(CellAlignment::Left),
        Cell::new("Size").set_alignment(CellAlignment::Right),
        Cell::new("Created").set_alignment(CellAlignment::Left),
        Cell::new("Path").set_alignment(CellAlignment::Left),
    ]);
    for p in profiles {
        let created = p
            .created
            .map(|t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&p.name),
            Cell::new(format::bytes(p.size_bytes)).set_alignment(CellAlignment::Right),
            Cell::new(&created),
            Cell::new(p.path.display()),
        ]);
    }
    table
}

/// Print a table indented by two spaces.
pub fn print_table(table: &Table) {
    for line in table.to_string().lines() {
        println!("  {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::lifecycle::ContainerStatus;
    use std::path::PathBuf;
    use std::time::Duration;

    fn info(env: Environment, running: bool) -> GameInfo {
        let mut container = ContainerStatus::absent("groucho-the-hunter-dev");
        if running {
            container.exists = true;
            container.running = true;
            container.status = "running".to_string();
            container.health = Health::Healthy;
            container.uptime = Some(Duration::from_secs(90));
        }
        GameInfo {
            environment: env,
            url: "http://localhost:3000".to_string(),
            container,
            container_error: None,
            reachable: running,
            host: None,
        }
    }

    #[test]
    fn status_rows_without_color() {
        let rendered = status_table(
            &[
                info(Environment::Development, true),
                info(Environment::Production, false),
            ],
            false,
        )
        .to_string();
        assert!(rendered.contains("Development"));
        assert!(rendered.contains("Production"));
        assert!(rendered.contains("\u{25cf} running"));
        assert!(rendered.contains("\u{25cf} not_created"));
        assert!(rendered.contains("1m 30s"));
        assert!(rendered.contains("\u{25cf} healthy"));
        assert!(!rendered.contains("\u{1b}["));
    }

    #[test]
    fn host_line_formats_missing_disk() {
        let line = host_line(&HostMetrics {
            cpu_percent: 12.5,
            memory_percent: 40.0,
            disk_percent: None,
        });
        assert_eq!(line, "CPU 12.5%  Memory 40.0%  Disk -");
    }

    #[test]
    fn browser_table_marks_external_owner() {
        let status = BrowserStatus {
            running: true,
            pid: Some(4242),
            port: 9222,
            debugging_available: true,
            browser_version: Some("Chrome/120.0".to_string()),
            executable: None,
            profile_path: PathBuf::from("/tmp/chrome-profile-groucho"),
            active_profile: None,
            external_owner: Some(crate::platform::PortOwner {
                pid: 4242,
                command: "chrome".to_string(),
            }),
        };
        let rendered = browser_table(&status, false).to_string();
        assert!(rendered.contains("chrome (PID 4242) (not started here)"));
        assert!(rendered.contains("http://127.0.0.1:9222"));
        assert!(rendered.contains("Chrome/120.0"));
        assert!(rendered.contains("not found"));
    }

    #[test]
    fn profiles_table_lists_sizes() {
        let rendered = profiles_table(&[Profile {
            name: "work".to_string(),
            path: PathBuf::from("/p/chrome-profile-work"),
            size_bytes: 2048,
            created: None,
        }])
        .to_string();
        assert!(rendered.contains("work"));
        assert!(rendered.contains("2.0 KB"));
    }
}
