use crate::Result;
use crate::behaviors::Handler;
use crate::events::{EventState, Listener};
use crate::page::Page;

pub(crate) fn install(page: &mut Page) -> Result<()> {
    for anchor in page.dom.query_selector_all(r##"a[href^="#"]"##)? {
        page.listeners.add(
            anchor,
            "click",
            Listener {
                capture: false,
                handler: Handler::SmoothScrollAnchor,
            },
        );
    }
    Ok(())
}

// Bare "#" and fragments without a matching element keep their default
// navigation; only real in-page targets get the animated scroll.
pub(crate) fn on_anchor_click(page: &mut Page, event: &mut EventState) -> Result<()> {
    let Some(href) = page.dom.attr(event.current_target, "href") else {
        return Ok(());
    };
    let Some(fragment) = href.strip_prefix('#') else {
        return Ok(());
    };
    if fragment.is_empty() {
        return Ok(());
    }
    let Some(target) = page.dom.by_id(fragment) else {
        return Ok(());
    };

    event.prevent_default();
    let top = page.element_top(target);
    page.smooth_scroll_to(top)
}
