//! DOM rendering of the session indicator

use bankscope_core::{StatusDisplay, StatusSurface, Urgency};
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// The page element that shows the remaining session time
pub struct ElementStatusSurface {
    element: HtmlElement,
}

impl ElementStatusSurface {
    pub const ELEMENT_ID: &'static str = "session-timer";

    /// Attach to the indicator element, if the page has one
    #[must_use]
    pub fn find() -> Option<Self> {
        gloo::utils::document()
            .get_element_by_id(Self::ELEMENT_ID)?
            .dyn_into::<HtmlElement>()
            .ok()
            .map(|element| Self { element })
    }
}

impl StatusSurface for ElementStatusSurface {
    fn render(&self, display: Option<&StatusDisplay>) {
        let classes = self.element.class_list();
        let _ = classes.remove_2(Urgency::Notice.css_class(), Urgency::Urgent.css_class());

        match display {
            Some(display) => {
                self.element.set_text_content(Some(&display.text()));
                let _ = classes.add_1(display.urgency.css_class());
                self.element.set_hidden(false);
            }
            None => {
                self.element.set_text_content(None);
                self.element.set_hidden(true);
            }
        }
    }
}
