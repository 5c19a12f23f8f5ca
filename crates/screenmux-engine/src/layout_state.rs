use screenmux_core::{LayoutParameter, LayoutParameterArray, MAX_PROCESSOR_SIZE};

// MARK: - LayoutMode

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// No layout applied; frames are blank.
    #[default]
    Empty,
    /// One source scaled onto the whole output.
    Native,
    /// Every element placed at its own bound.
    Complex,
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Native => write!(f, "native"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

// MARK: - LayoutState

/// Layout the engine composes from. Only requests mutate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutState {
    mode: LayoutMode,
    element_count: usize,
    parameters: LayoutParameterArray,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Empty,
            element_count: 0,
            parameters: [LayoutParameter::default(); MAX_PROCESSOR_SIZE],
        }
    }
}

impl LayoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// The meaningful prefix of the parameter array.
    pub fn parameters(&self) -> &[LayoutParameter] {
        &self.parameters[..self.element_count]
    }

    pub fn reset_layout(&mut self) {
        self.mode = LayoutMode::Empty;
        self.element_count = 0;
        self.parameters = [LayoutParameter::default(); MAX_PROCESSOR_SIZE];
    }

    /// Store a copy of `parameters`. The mode is left as is.
    pub fn set_layout_parameters(&mut self, element_count: usize, parameters: &LayoutParameterArray) {
        debug_assert!(element_count <= MAX_PROCESSOR_SIZE);
        self.element_count = element_count;
        self.parameters = *parameters;
    }

    pub fn set_native_layout(&mut self) {
        debug_assert_eq!(self.element_count, 1, "native layout needs exactly one element");
        self.mode = LayoutMode::Native;
    }

    pub fn set_complex_layout(&mut self) {
        self.mode = LayoutMode::Complex;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenmux_core::{Rect, WindowHandle};

    fn array_with(window: u64) -> LayoutParameterArray {
        let mut array = [LayoutParameter::default(); MAX_PROCESSOR_SIZE];
        array[0] = LayoutParameter::new(WindowHandle(window), Rect::from_size(10, 10), Rect::from_size(10, 10));
        array
    }

    #[test]
    fn starts_empty() {
        let state = LayoutState::new();
        assert_eq!(state.mode(), LayoutMode::Empty);
        assert_eq!(state.element_count(), 0);
        assert!(state.parameters().is_empty());
    }

    #[test]
    fn set_parameters_keeps_mode() {
        let mut state = LayoutState::new();
        state.set_layout_parameters(1, &array_with(3));
        assert_eq!(state.mode(), LayoutMode::Empty);
        assert_eq!(state.element_count(), 1);
        assert_eq!(state.parameters()[0].window, WindowHandle(3));
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = LayoutState::new();
        state.set_layout_parameters(1, &array_with(3));
        state.set_native_layout();
        state.reset_layout();
        assert_eq!(state, LayoutState::new());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exactly one element")]
    fn native_layout_with_two_elements_is_a_bug() {
        let mut state = LayoutState::new();
        state.set_layout_parameters(2, &array_with(3));
        state.set_native_layout();
    }
}
