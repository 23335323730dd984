//! Launch context of the current process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role the executable was launched in.
///
/// The engine re-launches the host executable for each of its helper
/// processes and marks the role with a `--type=<role>` switch. A launch
/// without the switch is the primary (browser) process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessRole {
    /// Primary process, owned by the host.
    Browser,
    Renderer,
    GpuProcess,
    Utility,
    Zygote,
    /// Any other role the engine defines.
    Other(String),
}

impl ProcessRole {
    /// Parses the value of a `--type=` switch.
    pub fn from_switch(value: &str) -> Self {
        match value {
            "" | "browser" => Self::Browser,
            "renderer" => Self::Renderer,
            "gpu-process" => Self::GpuProcess,
            "utility" => Self::Utility,
            "zygote" => Self::Zygote,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true for every role except the primary process.
    pub fn is_subprocess(&self) -> bool {
        !matches!(self, Self::Browser)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Browser => "browser",
            Self::Renderer => "renderer",
            Self::GpuProcess => "gpu-process",
            Self::Utility => "utility",
            Self::Zygote => "zygote",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command line of the current process, as handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainArgs {
    args: Vec<String>,
}

impl MainArgs {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Arguments of the running process. Non-UTF-8 arguments are converted lossily.
    pub fn from_env() -> Self {
        Self {
            args: std::env::args_os()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Role selected by the first `--type` switch, if any.
    pub fn role(&self) -> ProcessRole {
        let mut iter = self.args.iter().skip(1);
        while let Some(arg) = iter.next() {
            if let Some(value) = arg.strip_prefix("--type=") {
                return ProcessRole::from_switch(value);
            }
            if arg == "--type" {
                return iter
                    .next()
                    .map(|value| ProcessRole::from_switch(value))
                    .unwrap_or(ProcessRole::Browser);
            }
        }
        ProcessRole::Browser
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_without_type_switch_is_primary() {
        let args = MainArgs::new(["host", "--enable-logging"]);

        assert_eq!(args.role(), ProcessRole::Browser);
        assert!(!args.role().is_subprocess());
    }

    #[test]
    fn type_switch_selects_role() {
        assert_eq!(
            MainArgs::new(["host", "--type=renderer", "--lang=en"]).role(),
            ProcessRole::Renderer
        );
        assert_eq!(
            MainArgs::new(["host", "--type", "gpu-process"]).role(),
            ProcessRole::GpuProcess
        );
        assert_eq!(
            MainArgs::new(["host", "--type=crashpad-handler"]).role(),
            ProcessRole::Other("crashpad-handler".into())
        );
    }

    #[test]
    fn program_name_is_not_parsed_as_switch() {
        assert_eq!(MainArgs::new(["--type=renderer"]).role(), ProcessRole::Browser);
    }
}
