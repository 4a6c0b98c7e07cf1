//! The plain text artifact format
//!
//! ```text
//! Device: <manufacturer>, <model>
//! OS Version: <version>
//! App Version: <version>(<build>)
//! ---------------------
//!
//! <full cause-chain trace, one frame per line>
//! ```
//!
//! Environment entries that are not one of the well known keys are written as
//! `<key>: <value>` lines directly after the `App Version` line.
//!
//! Header values are kept on one line by escaping `\`, newlines and carriage
//! returns with a backslash, the same way a separator inside the model or an
//! entry key is escaped.

use fault_report::{Environment, FaultReport, FaultSummary, keys};
use std::io::{self, Write};

pub const SEPARATOR: &str = "---------------------";

const DEVICE: &str = "Device: ";
const OS_VERSION: &str = "OS Version: ";
const APP_VERSION: &str = "App Version: ";
const UNKNOWN: &str = "unknown";
const DEVICE_SEPARATOR: &str = ", ";
const ENTRY_SEPARATOR: &str = ": ";

/// A report as read back from a persisted artifact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedReport {
    pub environment: Environment,
    pub trace: FaultSummary,
}

/// Escapes a header value so it stays on a single line
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

pub fn write_report(w: &mut impl Write, report: &FaultReport) -> io::Result<()> {
    let env = report.environment();

    // `, ` in the model is written as `,\ ` so the last `, ` on the line
    // always separates it from the manufacturer
    writeln!(
        w,
        "{DEVICE}{}{DEVICE_SEPARATOR}{}",
        escape(env.manufacturer().unwrap_or(UNKNOWN)),
        escape(env.model().unwrap_or(UNKNOWN)).replace(DEVICE_SEPARATOR, ",\\ ")
    )?;
    writeln!(w, "{OS_VERSION}{}", escape(env.os_version().unwrap_or(UNKNOWN)))?;
    if let Some(app_version) = env.app_version() {
        writeln!(w, "{APP_VERSION}{}", escape(app_version))?;
    }
    for (key, value) in env.extra() {
        writeln!(
            w,
            "{}{ENTRY_SEPARATOR}{}",
            escape(key).replace(ENTRY_SEPARATOR, ":\\ "),
            escape(value)
        )?;
    }
    writeln!(w, "{SEPARATOR}\n")?;

    for line in report.summary().lines() {
        writeln!(w, "{line}")?;
    }

    Ok(())
}

#[inline]
fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_owned())
}

pub fn parse_report(contents: &str) -> io::Result<PersistedReport> {
    let mut lines = contents.lines();
    let mut environment = Environment::new();

    loop {
        let line = lines.next().ok_or_else(|| invalid("missing header separator"))?;

        if line == SEPARATOR {
            break;
        }

        if let Some(device) = line.strip_prefix(DEVICE) {
            let (manufacturer, model) = device
                .rsplit_once(DEVICE_SEPARATOR)
                .ok_or_else(|| invalid("malformed device line"))?;
            environment.insert(keys::MANUFACTURER, unescape(manufacturer));
            environment.insert(keys::MODEL, unescape(model));
        } else if let Some(os) = line.strip_prefix(OS_VERSION) {
            environment.insert(keys::OS_VERSION, unescape(os));
        } else if let Some(app) = line.strip_prefix(APP_VERSION) {
            environment.insert(keys::APP_VERSION, unescape(app));
        } else {
            let (key, value) = line
                .split_once(ENTRY_SEPARATOR)
                .ok_or_else(|| invalid("malformed environment line"))?;
            environment.insert(unescape(key), unescape(value));
        }
    }

    match lines.next() {
        Some("") => {}
        _ => return Err(invalid("expected a blank line after the header")),
    }

    Ok(PersistedReport {
        environment,
        trace: FaultSummary::from_lines(lines),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use fault_report::ThreadIdentity;

    fn report(env: Environment, lines: &[&str]) -> FaultReport {
        FaultReport::capture(
            ThreadIdentity::new(Some("main".to_owned()), "ThreadId(1)"),
            FaultSummary::from_lines(lines),
            env,
        )
    }

    #[test]
    fn writes_expected_layout() {
        let env = Environment::new()
            .with(keys::MANUFACTURER, "Embark")
            .with(keys::MODEL, "Devkit 3")
            .with(keys::OS_VERSION, "Linux 6.1.0")
            .with(keys::APP_VERSION, "1.4.2(88)");

        let mut out = Vec::new();
        write_report(
            &mut out,
            &report(env, &["java.lang.NullPointerException", "\tat Foo.bar"]),
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Device: Embark, Devkit 3\n\
             OS Version: Linux 6.1.0\n\
             App Version: 1.4.2(88)\n\
             ---------------------\n\
             \n\
             java.lang.NullPointerException\n\
             \tat Foo.bar\n"
        );
    }

    #[test]
    fn missing_metadata_is_unknown() {
        let mut out = Vec::new();
        write_report(&mut out, &report(Environment::new(), &["boom"])).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Device: unknown, unknown\nOS Version: unknown\n---"));
    }

    #[test]
    fn reads_back_extra_entries_and_blank_trace_lines() {
        let env = Environment::new()
            .with(keys::MANUFACTURER, "Embark")
            .with(keys::MODEL, "Devkit")
            .with(keys::OS_VERSION, "Linux 6.1.0")
            .with(keys::APP_VERSION, "0.1.0(1)")
            .with("locale", "sv-SE");

        let mut out = Vec::new();
        write_report(&mut out, &report(env.clone(), &["first", "", "third"])).unwrap();

        let parsed = parse_report(std::str::from_utf8(&out).unwrap()).unwrap();
        assert_eq!(parsed.environment, env);
        assert_eq!(parsed.trace.lines(), ["first", "", "third"]);
    }

    #[test]
    fn reads_back_separators_inside_values() {
        let env = Environment::new()
            .with(keys::MANUFACTURER, "Micro-Star International Co., Ltd.")
            .with(keys::MODEL, "MS-7C02, rev 1.0")
            .with(keys::OS_VERSION, "Linux 6.1.0")
            .with(keys::APP_VERSION, "0.1.0(1)")
            .with("notes", "line one\nline two\r\n---------------------")
            .with("path", r"C:\\Users\new")
            .with("odd: key", "a: b");

        let mut out = Vec::new();
        write_report(&mut out, &report(env.clone(), &["boom"])).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(
            "Device: Micro-Star International Co., Ltd., MS-7C02,\\ rev 1.0\n"
        ));
        assert!(text.contains("notes: line one\\nline two\\r\\n---------------------\n"));

        let parsed = parse_report(&text).unwrap();
        assert_eq!(parsed.environment, env);
        assert_eq!(parsed.trace.lines(), ["boom"]);
    }

    #[test]
    fn rejects_truncated() {
        let err = parse_report("Device: a, b\nOS Version: 1\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
