use thiserror::Error;

/// Fatal errors for one evaluation run.
///
/// Resolution failures and missing properties are never reported here; they degrade individual
/// results instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("template must be a JSON object")]
    TemplateNotObject,

    #[error("template has no `resources` array")]
    MissingResources,

    #[error("{stage} did not converge after {iterations} scans")]
    MergeDidNotConverge {
        stage: &'static str,
        iterations: usize,
    },

    #[error("resource #{token} appears more than once in a single chain")]
    RepeatedToken { token: usize },
}

/// Defects in the control catalog itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("feature '{feature}' declares no supported resource types")]
    EmptySupportedTypes { feature: String },

    #[error("feature '{feature}' is declared more than once")]
    DuplicateFeature { feature: String },

    #[error("control '{control}' declares no property selectors")]
    NoSelectors { control: String },

    #[error("invalid property selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}
