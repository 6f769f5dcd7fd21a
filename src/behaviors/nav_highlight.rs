use crate::Result;
use crate::page::Page;

// Marks the navigation link matching the current page. Runs once; nothing
// here reacts to later events.
pub(crate) fn install(page: &mut Page) -> Result<()> {
    let current = page.url.final_segment(&page.config.home_filename);
    for link in page.dom.query_selector_all("nav ul li a")? {
        if page.dom.attr(link, "href").as_deref() == Some(current.as_str()) {
            page.dom.add_class(link, "active");
        }
    }
    Ok(())
}
