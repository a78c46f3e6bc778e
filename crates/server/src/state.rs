use linter_rules::RuleTester;

pub struct AppState {
    pub tester: RuleTester,
    /// `*` or a single allowed origin.
    pub cors_origin: String,
}

impl AppState {
    pub fn new(tester: RuleTester) -> Self {
        Self {
            tester,
            cors_origin: "*".to_string(),
        }
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = origin.into();
        self
    }
}
