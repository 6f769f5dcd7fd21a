use crate::Result;
use crate::behaviors::Handler;
use crate::dom::NodeId;
use crate::events::{EventState, Listener};
use crate::page::Page;

const BUTTON_ID: &str = "backToTop";

#[derive(Debug, Default)]
pub(crate) struct BackToTopState {
    pub(crate) button: Option<NodeId>,
}

pub(crate) fn install(page: &mut Page) -> Result<()> {
    let button = match page.dom.by_id(BUTTON_ID) {
        Some(existing) => existing,
        None => {
            let button = page.dom.create_detached_element("button");
            page.dom.set_attr(button, "id", BUTTON_ID)?;
            page.dom.set_attr(button, "title", "Back to Top")?;
            page.dom.create_text(button, "↑".to_string());
            let body = page.dom.body_or_root();
            page.dom.append_child(body, button)?;
            button
        }
    };
    page.back_to_top.button = Some(button);

    page.listeners.add(
        button,
        "click",
        Listener {
            capture: false,
            handler: Handler::BackToTopClick,
        },
    );
    let root = page.dom.root;
    page.listeners.add(
        root,
        "scroll",
        Listener {
            capture: false,
            handler: Handler::BackToTopScroll,
        },
    );
    Ok(())
}

// Visible strictly above the threshold, hidden at or below it.
pub(crate) fn on_scroll(page: &mut Page, _event: &mut EventState) -> Result<()> {
    let Some(button) = page.back_to_top.button else {
        return Ok(());
    };
    if page.scroll_top() > page.config.scroll_threshold {
        page.dom.add_class(button, "show");
    } else {
        page.dom.remove_class(button, "show");
    }
    Ok(())
}

pub(crate) fn on_click(page: &mut Page, _event: &mut EventState) -> Result<()> {
    page.smooth_scroll_to(0)
}
