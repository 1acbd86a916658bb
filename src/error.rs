use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Classification itself never fails: problems with a single parameter, field or structure are
/// reported through the per-symbol [`crate::diagnostics::Log`] and the engine substitutes a safe
/// default. This enum therefore only covers failures at the edges of the library, such as
/// registering types, looking them up by name, acquiring the shared definition cache, or writing
/// the generated code to an I/O sink.
///
/// # Error Categories
///
/// ## Type Universe Errors
/// - [`Error::TypeNotFound`] - Requested type not registered
/// - [`Error::TypeAlreadyDefined`] - A forward-declared type was defined twice
/// - [`Error::Malformed`] - Inconsistent type description handed to the universe
///
/// ## Analysis Errors
/// - [`Error::RecursionLimit`] - Maximum recursion depth exceeded
/// - [`Error::LockError`] - Thread synchronization failure
///
/// ## Output Errors
/// - [`Error::Io`] - Writing to an I/O sink failed
/// - [`Error::Fmt`] - Writing to a formatter failed
///
/// # Examples
///
/// ```rust
/// use marshalscope::{Error, marshal::TypeUniverse};
///
/// let universe = TypeUniverse::new();
/// match universe.find("Contoso.Missing") {
///     Err(Error::TypeNotFound(name)) => println!("{} is not registered", name),
///     Err(e) => eprintln!("Other error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A type description handed to the library is inconsistent.
    ///
    /// The error includes the source location where the problem was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A type with the given full name is not registered in the universe.
    #[error("Failed to find type in TypeUniverse - {0}")]
    TypeNotFound(String),

    /// A forward-declared type received a second definition.
    #[error("Type has already been defined - {0}")]
    TypeAlreadyDefined(String),

    /// Reached the maximum recursion depth while following type references.
    ///
    /// Guards the walks over user supplied type graphs (for example the unwrapping of
    /// single-field structures) against malformed, self-referencing descriptions.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Failed to acquire the lock of a shared resource.
    ///
    /// Happens when the mutex guarding a [`crate::marshal::SharedDefinitionCache`] has been
    /// poisoned by a panicking thread.
    #[error("Failed to lock target")]
    LockError,

    /// Writing generated output to an I/O sink failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Writing generated output to a formatter failed.
    #[error("{0}")]
    Fmt(#[from] std::fmt::Error),
}
