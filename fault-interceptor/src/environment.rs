use crate::Error;
use fault_report::{Environment, keys};

/// Describes the application the interceptor is installed in
#[derive(Clone, Debug)]
pub struct AppContext {
    /// The package identifier, eg. the crate name
    pub package: String,
    /// The human readable version
    pub version: String,
    /// The build identifier
    pub build: String,
    /// Additional free-form metadata added to every report
    pub extra: Environment,
}

impl AppContext {
    pub fn new(
        package: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            build: build.into(),
            extra: Environment::new(),
        }
    }

    /// Adds a free-form entry that is included in every report
    #[inline]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key, value);
        self
    }

    /// The `<version>(<build>)` string written to reports
    #[inline]
    pub fn app_version(&self) -> String {
        format!("{}({})", self.version, self.build)
    }
}

/// Creates an [`AppContext`] for the calling crate, using its package name and
/// version from Cargo, and the specified build identifier
#[macro_export]
macro_rules! app_context {
    ($build:expr) => {
        $crate::AppContext::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), $build)
    };
}

/// Gathers the metadata every report is enriched with.
///
/// `host` overrides the detected manufacturer, model and OS version.
pub(crate) fn collect(app: &AppContext, host: Option<Environment>) -> Result<Environment, Error> {
    if app.package.trim().is_empty() {
        return Err(Error::Configuration {
            what: "the app package",
            source: None,
        });
    }

    if app.version.trim().is_empty() {
        return Err(Error::Configuration {
            what: "the app version",
            source: None,
        });
    }

    let mut env = match host {
        Some(host) => host,
        None => detect_host()?,
    };

    env.insert(keys::APP_VERSION, app.app_version());
    for (key, value) in app.extra.iter() {
        env.insert(key, value);
    }

    Ok(env)
}

fn detect_host() -> Result<Environment, Error> {
    let (manufacturer, model) = device();

    Ok(Environment::new()
        .with(keys::MANUFACTURER, manufacturer)
        .with(keys::MODEL, model)
        .with(keys::OS_VERSION, os_version()?))
}

const UNKNOWN: &str = "unknown";

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        fn device() -> (String, String) {
            let read = |path: &str| {
                std::fs::read_to_string(path)
                    .ok()
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| UNKNOWN.to_owned())
            };

            (
                read("/sys/class/dmi/id/sys_vendor"),
                read("/sys/class/dmi/id/product_name"),
            )
        }
    } else if #[cfg(target_os = "macos")] {
        fn device() -> (String, String) {
            ("Apple".to_owned(), UNKNOWN.to_owned())
        }
    } else {
        fn device() -> (String, String) {
            (UNKNOWN.to_owned(), UNKNOWN.to_owned())
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        #[allow(unsafe_code)]
        fn os_version() -> Result<String, Error> {
            use std::ffi::CStr;

            // SAFETY: syscall, utsname is plain old data
            let uts = unsafe {
                let mut uts: libc::utsname = std::mem::zeroed();
                if libc::uname(&mut uts) != 0 {
                    return Err(Error::Configuration {
                        what: "the OS version",
                        source: Some(std::io::Error::last_os_error()),
                    });
                }
                uts
            };

            // SAFETY: uname nul terminates every field
            let field = |f: &[libc::c_char]| unsafe { CStr::from_ptr(f.as_ptr()) }
                .to_string_lossy()
                .into_owned();

            Ok(format!("{} {}", field(&uts.sysname), field(&uts.release)))
        }
    } else {
        fn os_version() -> Result<String, Error> {
            Ok(std::env::consts::OS.to_owned())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_missing_version() {
        let err = collect(&AppContext::new("sadness", "", "1"), Some(Environment::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration {
                what: "the app version",
                ..
            }
        ));
    }

    #[test]
    fn rejects_missing_package() {
        assert!(collect(&AppContext::new(" ", "1.0.0", "1"), None).is_err());
    }

    #[test]
    fn host_override_and_extras() {
        let app = AppContext::new("sadness", "1.0.0", "42").with_entry("locale", "sv-SE");
        let host = Environment::new()
            .with(keys::MANUFACTURER, "Embark")
            .with(keys::MODEL, "Devkit")
            .with(keys::OS_VERSION, "Linux 6.1.0");

        let env = collect(&app, Some(host)).unwrap();
        assert_eq!(env.app_version(), Some("1.0.0(42)"));
        assert_eq!(env.manufacturer(), Some("Embark"));
        assert_eq!(env.get("locale"), Some("sv-SE"));
    }

    #[test]
    fn detects_host() {
        let env = collect(&crate::app_context!("7"), None).unwrap();

        assert_eq!(env.app_version(), Some(concat!(env!("CARGO_PKG_VERSION"), "(7)")));
        assert!(env.manufacturer().is_some());
        assert!(!env.os_version().unwrap().is_empty());
    }
}
