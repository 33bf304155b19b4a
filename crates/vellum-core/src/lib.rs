mod diag;
mod format;
mod location;

pub use diag::{CollectedDiagnostics, Diagnostic, DiagnosticSink, Severity};
pub use format::{Encoding, WriterConfig};
pub use location::{normalize_path, parse_scheme, resolve_output_location, ResolvedLocation};

#[cfg(test)]
mod tests;
