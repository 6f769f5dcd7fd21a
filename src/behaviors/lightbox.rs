use crate::Result;
use crate::behaviors::Handler;
use crate::dom::NodeId;
use crate::events::{EventState, Listener};
use crate::page::Page;

const THUMB_SELECTOR: &str = ".gallery-item img, .thumb img";

#[derive(Debug, Default)]
pub(crate) struct LightboxState {
    pub(crate) overlay: Option<NodeId>,
    pub(crate) close: Option<NodeId>,
    pub(crate) image: Option<NodeId>,
    pub(crate) caption: Option<NodeId>,
}

pub(crate) fn install(page: &mut Page) -> Result<()> {
    let thumbs = page.dom.query_selector_all(THUMB_SELECTOR)?;
    if thumbs.is_empty() {
        return Ok(());
    }

    build_overlay(page)?;

    for thumb in thumbs {
        let style = pointer_cursor_style(page.dom.attr(thumb, "style").as_deref());
        page.dom.set_attr(thumb, "style", &style)?;
        page.listeners.add(
            thumb,
            "click",
            Listener {
                capture: false,
                handler: Handler::LightboxThumbnail,
            },
        );
    }

    if let Some(close) = page.lightbox.close {
        page.listeners.add(
            close,
            "click",
            Listener {
                capture: false,
                handler: Handler::LightboxClose,
            },
        );
    }
    if let Some(overlay) = page.lightbox.overlay {
        page.listeners.add(
            overlay,
            "click",
            Listener {
                capture: false,
                handler: Handler::LightboxBackdrop,
            },
        );
    }
    let root = page.dom.root;
    page.listeners.add(
        root,
        "keydown",
        Listener {
            capture: false,
            handler: Handler::LightboxKeydown,
        },
    );
    Ok(())
}

// The overlay is built once and attached to the body; a second install
// finds the existing one and rewires its pieces.
fn build_overlay(page: &mut Page) -> Result<()> {
    if let Some(existing) = page.dom.by_id("lightbox") {
        page.lightbox.overlay = Some(existing);
        page.lightbox.close = page.dom.query_selector_from(existing, ".lightbox-close")?;
        page.lightbox.image = page.dom.query_selector_from(existing, ".lightbox-image")?;
        page.lightbox.caption = page.dom.query_selector_from(existing, ".lightbox-caption")?;
        return Ok(());
    }

    let overlay = page.dom.create_detached_element("div");
    page.dom.set_attr(overlay, "id", "lightbox")?;
    page.dom.set_attr(overlay, "class", "lightbox")?;

    let close = page.dom.create_detached_element("span");
    page.dom.set_attr(close, "class", "lightbox-close")?;
    page.dom.create_text(close, "×".to_string());

    let image = page.dom.create_detached_element("img");
    page.dom.set_attr(image, "class", "lightbox-image")?;
    page.dom.set_attr(image, "src", "")?;
    page.dom.set_attr(image, "alt", "")?;

    let caption = page.dom.create_detached_element("div");
    page.dom.set_attr(caption, "class", "lightbox-caption")?;

    page.dom.append_child(overlay, close)?;
    page.dom.append_child(overlay, image)?;
    page.dom.append_child(overlay, caption)?;
    let body = page.dom.body_or_root();
    page.dom.append_child(body, overlay)?;

    page.lightbox.overlay = Some(overlay);
    page.lightbox.close = Some(close);
    page.lightbox.image = Some(image);
    page.lightbox.caption = Some(caption);
    Ok(())
}

pub(crate) fn on_thumbnail_click(page: &mut Page, event: &mut EventState) -> Result<()> {
    let thumb = event.current_target;

    // A thumbnail wrapped in a link must not navigate.
    if page.dom.find_ancestor_by_tag(thumb, "a").is_some() {
        event.prevent_default();
    }

    let (Some(overlay), Some(image), Some(caption)) = (
        page.lightbox.overlay,
        page.lightbox.image,
        page.lightbox.caption,
    ) else {
        return Ok(());
    };

    let src = page.dom.attr(thumb, "src").unwrap_or_default();
    let text = page
        .dom
        .attr(thumb, "alt")
        .filter(|alt| !alt.is_empty())
        .unwrap_or_else(|| page.config.default_caption.clone());

    page.dom.set_attr(image, "src", &src)?;
    page.dom.set_text_content(caption, &text)?;
    page.dom.add_class(overlay, "show");
    Ok(())
}

pub(crate) fn on_close_click(page: &mut Page, _event: &mut EventState) -> Result<()> {
    hide(page);
    Ok(())
}

// Clicks inside the overlay bubble here too; only a hit on the backdrop
// itself closes, so clicking the image keeps it open.
pub(crate) fn on_backdrop_click(page: &mut Page, event: &mut EventState) -> Result<()> {
    if Some(event.target) == page.lightbox.overlay {
        hide(page);
    }
    Ok(())
}

pub(crate) fn on_keydown(page: &mut Page, event: &mut EventState) -> Result<()> {
    if event.key.as_deref() == Some("Escape") && shown(page) {
        hide(page);
    }
    Ok(())
}

fn shown(page: &Page) -> bool {
    page.lightbox
        .overlay
        .map(|overlay| page.dom.has_class(overlay, "show"))
        .unwrap_or(false)
}

fn hide(page: &mut Page) {
    if let Some(overlay) = page.lightbox.overlay {
        page.dom.remove_class(overlay, "show");
    }
}

// Appends the cursor hint without clobbering inline styles the markup
// already carries.
fn pointer_cursor_style(existing: Option<&str>) -> String {
    match existing {
        Some(style) if !style.trim().is_empty() => {
            if style.contains("cursor:") {
                style.to_string()
            } else {
                format!("{}; cursor: pointer", style.trim_end().trim_end_matches(';'))
            }
        }
        _ => "cursor: pointer".to_string(),
    }
}
