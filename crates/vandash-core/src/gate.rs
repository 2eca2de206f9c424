// ── Loading / error / content selection ──

/// Which view a query-backed widget should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Loading,
    ErrorDisplay,
    Content,
}

/// Inputs to [`select`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateInput {
    pub is_loading: bool,
    pub is_fetching: bool,
    pub has_error: bool,
    /// Treat background refetches as loading too.
    pub check_fetching: bool,
}

/// Loading beats error, error beats content.
pub fn select(input: GateInput) -> Gate {
    if input.is_loading || (input.check_fetching && input.is_fetching) {
        Gate::Loading
    } else if input.has_error {
        Gate::ErrorDisplay
    } else {
        Gate::Content
    }
}
