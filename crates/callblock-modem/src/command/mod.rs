//! AT command builder.

/// AT command understood by Hayes-compatible voice modems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// AT - Attention, used as a liveness probe
    Attention,
    /// ATZ - Reset to the stored profile
    Reset,
    /// Dialect-specific caller-ID enable command (e.g., `AT+VCID=1`)
    EnableCallerId {
        /// Full command text
        command: String,
    },
    /// ATH1 - Go off-hook (answer the line)
    OffHook,
    /// ATH0 - Go on-hook (hang up)
    OnHook,
    /// Arbitrary command text
    Raw(String),
}

impl Command {
    /// Returns the command text without terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Attention => "AT",
            Self::Reset => "ATZ",
            Self::EnableCallerId { command } | Self::Raw(command) => command,
            Self::OffHook => "ATH1",
            Self::OnHook => "ATH0",
        }
    }

    /// Serializes the command to bytes.
    ///
    /// Modems expect a carriage return after each command; one is appended
    /// unless the text already ends with a line terminator.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let text = self.as_str();
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        if !text.ends_with(['\r', '\n']) {
            buf.push(b'\r');
        }
        buf
    }

    /// Returns true if `line` is the modem echoing this command back.
    #[must_use]
    pub fn is_echo(&self, line: &str) -> bool {
        line.trim().eq_ignore_ascii_case(self.as_str().trim())
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str().trim_end())
    }
}
