use crate::Result;
use crate::behaviors::Handler;
use crate::events::{EventState, Listener};
use crate::page::Page;

const TOGGLE_SELECTOR: &str = ".mobile-menu-toggle";

// The breakpoint is consulted once at load and never re-evaluated; a page
// resized afterwards keeps whatever wiring it got here.
pub(crate) fn install(page: &mut Page) -> Result<()> {
    if page.config.viewport_width > page.config.menu_breakpoint {
        return Ok(());
    }
    let Some(nav) = page.dom.first_element_by_tag("nav") else {
        return Ok(());
    };
    if page.dom.query_selector(TOGGLE_SELECTOR)?.is_some() {
        return Ok(());
    }
    let Some(parent) = page.dom.parent(nav) else {
        return Ok(());
    };

    let toggle = page.dom.create_detached_element("button");
    page.dom.set_attr(toggle, "class", "mobile-menu-toggle")?;
    page.dom.set_attr(toggle, "aria-label", "Toggle menu")?;
    page.dom.create_text(toggle, "☰".to_string());
    page.dom.insert_before(parent, toggle, nav)?;

    page.listeners.add(
        toggle,
        "click",
        Listener {
            capture: false,
            handler: Handler::MenuToggle,
        },
    );
    Ok(())
}

pub(crate) fn on_toggle_click(page: &mut Page, _event: &mut EventState) -> Result<()> {
    let Some(nav) = page.dom.first_element_by_tag("nav") else {
        return Ok(());
    };
    if let Some(list) = page.dom.query_selector_from(nav, "ul")? {
        page.dom.toggle_class(list, "show");
    }
    Ok(())
}
