/// The contract a host implements to give `CMD` messages meaning.
///
/// The channel knows nothing about the host language; swapping the
/// evaluator retargets command handling entirely.
pub trait Evaluator {
    /// A successfully evaluated value, before conversion to reply text.
    type Value;

    /// Compile and run `text` in the host's evaluation environment.
    ///
    /// Host evaluation failures must be captured and returned as the
    /// error text, never raised out of this call. The error text becomes
    /// the body of the `ERR` reply.
    fn evaluate(&mut self, text: &str) -> std::result::Result<Self::Value, String>;

    /// Convert a successful value to reply text.
    ///
    /// The representation should round-trip through the host: full
    /// precision for floating-point values, a canonical form for void.
    fn stringify(&mut self, value: &Self::Value) -> String;
}

/// Evaluator for pure clients: rejects every command.
///
/// Peers get an `ERR` reply instead of a silently dropped command.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl Evaluator for Unsupported {
    type Value = ();

    fn evaluate(&mut self, _text: &str) -> std::result::Result<(), String> {
        Err("command evaluation not supported by this peer".to_string())
    }

    fn stringify(&mut self, _value: &()) -> String {
        String::new()
    }
}
