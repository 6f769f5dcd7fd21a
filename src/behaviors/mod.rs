use crate::Result;
use crate::page::Page;

pub(crate) mod back_to_top;
pub(crate) mod feedback_form;
pub(crate) mod lightbox;
pub(crate) mod mobile_menu;
pub(crate) mod nav_highlight;
pub(crate) mod smooth_scroll;

/// Names a behavior reaction a listener triggers. The page maps each value
/// to its handler function at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    FeedbackSubmit,
    LightboxThumbnail,
    LightboxClose,
    LightboxBackdrop,
    LightboxKeydown,
    SmoothScrollAnchor,
    BackToTopScroll,
    BackToTopClick,
    MenuToggle,
}

// The load-time wiring pass. Each install is independent and skips itself
// when its markup hooks are absent.
pub(crate) fn install_all(page: &mut Page) -> Result<()> {
    nav_highlight::install(page)?;
    feedback_form::install(page)?;
    lightbox::install(page)?;
    smooth_scroll::install(page)?;
    back_to_top::install(page)?;
    mobile_menu::install(page)
}
