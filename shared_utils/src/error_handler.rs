//! Error reporting helpers
//!
//! Per-file failures are shown to the operator with their whole cause chain,
//! so "could not decode" also says *why*.

/// `error: cause: cause` on one line.
pub fn error_chain<E: std::error::Error + ?Sized>(error: &E) -> String {
    let mut msg = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        msg.push_str(": ");
        msg.push_str(&err.to_string());
        source = err.source();
    }
    msg
}

/// Print an error and its causes to stderr and the log.
pub fn report_error<E: std::error::Error + ?Sized>(error: &E) {
    eprintln!("🔥 ERROR: {}", error);

    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        eprintln!("   {}. Caused by: {}", level, err);
        source = err.source();
        level += 1;
    }

    tracing::error!(error = %error_chain(error), "Error occurred");
}
