use thiserror;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("report number '{input}' is not of the form 'BF <year> <district> <sequence>'")]
    MalformedReportNumber { input: String },
    #[error("report number '{input}' has a non-numeric {field}")]
    NonNumericReportNumberField { input: String, field: &'static str },
}
