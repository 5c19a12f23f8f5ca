//! Layout change requests.
//!
//! A [`Request`] carries its own copy of the data it needs and knows which
//! [`LayoutState`] transitions it triggers. Hosts build one, hand it to
//! [`Engine::dispatch`](crate::Engine::dispatch) and drop it.

use screenmux_core::{
    config::to_parameter_array, LayoutParameter, LayoutParameterArray, LayoutProfile, ScreenMuxError,
    MAX_PROCESSOR_SIZE,
};

use crate::layout_state::LayoutState;

// MARK: - Request

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Clear the compositor to the empty layout.
    ResetLayout,
    /// Replace the layout.
    SetLayout(SetLayoutRequest),
}

impl Request {
    pub fn reset_layout() -> Self {
        Self::ResetLayout
    }

    pub fn set_layout(element_count: usize, parameters: &LayoutParameterArray) -> Self {
        Self::SetLayout(SetLayoutRequest::new(element_count, parameters))
    }

    /// Apply this request to `layout`.
    pub fn send_to(&self, layout: &mut LayoutState) {
        match self {
            Self::ResetLayout => layout.reset_layout(),
            Self::SetLayout(request) => request.send_to(layout),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ResetLayout => "reset_layout",
            Self::SetLayout(_) => "set_layout",
        }
    }
}

impl From<SetLayoutRequest> for Request {
    fn from(request: SetLayoutRequest) -> Self {
        Self::SetLayout(request)
    }
}

// MARK: - SetLayoutRequest

/// Immutable layout payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLayoutRequest {
    element_count: usize,
    parameters: LayoutParameterArray,
}

impl SetLayoutRequest {
    /// Copies `parameters`; later changes to the caller's array are not seen.
    ///
    /// # Panics
    ///
    /// Panics if `element_count` exceeds [`MAX_PROCESSOR_SIZE`].
    pub fn new(element_count: usize, parameters: &LayoutParameterArray) -> Self {
        assert!(
            element_count <= MAX_PROCESSOR_SIZE,
            "element_count {element_count} exceeds MAX_PROCESSOR_SIZE"
        );
        Self { element_count, parameters: *parameters }
    }

    pub fn from_elements(elements: &[LayoutParameter]) -> Result<Self, ScreenMuxError> {
        let (element_count, parameters) = to_parameter_array(elements)?;
        Ok(Self { element_count, parameters })
    }

    pub fn from_profile(profile: &LayoutProfile) -> Result<Self, ScreenMuxError> {
        Self::from_elements(&profile.elements)
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn parameters(&self) -> &[LayoutParameter] {
        &self.parameters[..self.element_count]
    }

    fn send_to(&self, layout: &mut LayoutState) {
        layout.set_layout_parameters(self.element_count, &self.parameters);
        // element_count == 0 lands in the complex branch too.
        if self.element_count == 1 {
            layout.set_native_layout();
        } else {
            layout.set_complex_layout();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_state::LayoutMode;
    use screenmux_core::{Rect, WindowHandle};

    fn param(window: u64) -> LayoutParameter {
        LayoutParameter::new(
            WindowHandle(window),
            Rect::from_size(100, 100),
            Rect::new(window as i32 * 10, 0, 50, 50),
        )
    }

    fn array(count: usize) -> LayoutParameterArray {
        let mut array = [LayoutParameter::default(); MAX_PROCESSOR_SIZE];
        for (i, slot) in array.iter_mut().take(count).enumerate() {
            *slot = param(i as u64 + 1);
        }
        array
    }

    #[test]
    fn mode_follows_element_count() {
        for count in 0..=MAX_PROCESSOR_SIZE {
            let mut layout = LayoutState::new();
            Request::set_layout(count, &array(count)).send_to(&mut layout);
            assert_eq!(layout.element_count(), count);
            let expected = if count == 1 { LayoutMode::Native } else { LayoutMode::Complex };
            assert_eq!(layout.mode(), expected, "element_count={count}");
        }
    }

    #[test]
    fn zero_elements_is_complex() {
        let mut layout = LayoutState::new();
        Request::set_layout(0, &array(0)).send_to(&mut layout);
        assert_eq!(layout.mode(), LayoutMode::Complex);
        assert!(layout.parameters().is_empty());
    }

    #[test]
    fn reset_after_any_layout_returns_to_empty() {
        for count in 0..=MAX_PROCESSOR_SIZE {
            let mut layout = LayoutState::new();
            Request::set_layout(count, &array(count)).send_to(&mut layout);
            Request::reset_layout().send_to(&mut layout);
            assert_eq!(layout.mode(), LayoutMode::Empty);
            assert_eq!(layout.element_count(), 0);
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let reset = Request::reset_layout();
        let mut once = LayoutState::new();
        Request::set_layout(3, &array(3)).send_to(&mut once);
        reset.send_to(&mut once);

        let mut twice = once;
        reset.send_to(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn request_owns_its_parameters() {
        let mut caller = array(2);
        let request = SetLayoutRequest::new(2, &caller);
        caller[0] = param(99);
        caller[1].bound = Rect::from_size(1, 1);

        let mut layout = LayoutState::new();
        Request::from(request).send_to(&mut layout);
        assert_eq!(layout.parameters()[0], param(1));
        assert_eq!(layout.parameters()[1], param(2));
    }

    #[test]
    fn native_then_complex_then_reset() {
        let p = array(3);
        let mut layout = LayoutState::new();

        Request::set_layout(1, &p).send_to(&mut layout);
        assert_eq!(layout.mode(), LayoutMode::Native);
        assert_eq!(layout.element_count(), 1);
        assert_eq!(layout.parameters()[0], p[0]);

        Request::set_layout(3, &p).send_to(&mut layout);
        assert_eq!(layout.mode(), LayoutMode::Complex);
        assert_eq!(layout.element_count(), 3);
        assert_eq!(layout.parameters(), &p[..3]);

        Request::reset_layout().send_to(&mut layout);
        assert_eq!(layout.mode(), LayoutMode::Empty);
        assert_eq!(layout.element_count(), 0);
    }

    #[test]
    fn from_elements_rejects_overflow() {
        let elements = vec![param(1); MAX_PROCESSOR_SIZE + 1];
        assert!(matches!(
            SetLayoutRequest::from_elements(&elements),
            Err(ScreenMuxError::TooManyElements { .. })
        ));
        let ok = SetLayoutRequest::from_elements(&elements[..2]).unwrap();
        assert_eq!(ok.element_count(), 2);
        assert_eq!(ok.parameters(), &elements[..2]);
    }

    #[test]
    #[should_panic(expected = "exceeds MAX_PROCESSOR_SIZE")]
    fn oversized_count_panics() {
        let _ = SetLayoutRequest::new(MAX_PROCESSOR_SIZE + 1, &array(0));
    }
}
