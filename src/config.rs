//! The tuning-knob record.
//!
//! Every knob is a pure input threaded into the walker at entry: a single
//! configuration record replacing a module-level global config struct,
//! passed in explicitly alongside a sink handle.

/// One of the six collision-renaming schemes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenameMethod {
    PrefixCounter,
    PrefixCounterRandom,
    InfixCounter,
    InfixCounterRandom,
    PostfixCounter,
    PostfixCounterRandom,
}

impl Default for RenameMethod {
    fn default() -> Self {
        RenameMethod::PostfixCounter
    }
}

/// `unpack_mode` knob.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnpackMode {
    ToDirectory,
    InMemory,
    ListOnly,
}

impl Default for UnpackMode {
    fn default() -> Self {
        UnpackMode::ToDirectory
    }
}

/// All tuning knobs, collected into one record passed into
/// the walker at entry. No mid-run mutation is required.
#[derive(Clone, Debug)]
pub struct Config {
    pub decode_base64: bool,
    pub decode_qp: bool,
    pub decode_uu: bool,
    pub decode_tnef: bool,
    pub decode_ole: bool,
    pub decode_mht: bool,
    pub max_recursion_level: u32,
    pub name_by_type: bool,
    pub no_nameless: bool,
    pub multiple_filenames: bool,
    pub header_longsearch: bool,
    /// Bounded retry count used by the "long search" filter, tied to the
    /// same toggle as `header_longsearch`.
    pub header_longsearch_attempts: u32,
    pub rename_method: RenameMethod,
    pub unpack_mode: UnpackMode,
    /// "double-CR save" behaviour.
    pub double_cr_save: bool,
    /// Retain a zero-length part's output file.
    pub keep_empty: bool,
    /// Emit unknown CFBF streams as `ole-stream.<start_sector>` rather
    /// than discarding them.
    pub emit_unknown_ole_streams: bool,
    /// Default filename prefix for nameless parts.
    pub default_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            decode_base64: true,
            decode_qp: true,
            decode_uu: true,
            decode_tnef: true,
            decode_ole: true,
            decode_mht: true,
            max_recursion_level: 20,
            name_by_type: false,
            no_nameless: false,
            multiple_filenames: false,
            header_longsearch: false,
            header_longsearch_attempts: 20,
            rename_method: RenameMethod::default(),
            unpack_mode: UnpackMode::default(),
            double_cr_save: true,
            keep_empty: false,
            emit_unknown_ole_streams: false,
            default_name_prefix: "textfile".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.max_recursion_level, 20);
        assert!(cfg.decode_base64);
        assert!(cfg.decode_ole);
        assert_eq!(cfg.default_name_prefix, "textfile");
    }
}
