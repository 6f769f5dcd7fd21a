#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocumentUrl {
    pub(crate) pathname: String,
    pub(crate) search: String,
    pub(crate) hash: String,
}

impl DocumentUrl {
    pub(crate) fn parse(url: &str) -> Self {
        let trimmed = url.trim();
        let rest = match trimmed.find("://") {
            Some(scheme_end) => {
                let after_authority = &trimmed[scheme_end + 3..];
                match after_authority.find(['/', '?', '#']) {
                    Some(pos) => &after_authority[pos..],
                    None => "/",
                }
            }
            None => trimmed,
        };

        let (pathname, search, hash) = split_path_search_hash(rest);
        let pathname = if pathname.is_empty() {
            "/".to_string()
        } else {
            pathname
        };
        Self {
            pathname,
            search,
            hash,
        }
    }

    // The last path segment names the current page; an empty segment means
    // the directory default.
    pub(crate) fn final_segment(&self, home: &str) -> String {
        let segment = self.pathname.rsplit('/').next().unwrap_or("");
        if segment.is_empty() {
            home.to_string()
        } else {
            segment.to_string()
        }
    }
}

fn split_path_search_hash(tail: &str) -> (String, String, String) {
    let mut pathname = tail;
    let mut search = "";
    let mut hash = "";

    if let Some(hash_pos) = tail.find('#') {
        pathname = &tail[..hash_pos];
        hash = &tail[hash_pos..];
    }

    if let Some(search_pos) = pathname.find('?') {
        search = &pathname[search_pos..];
        pathname = &pathname[..search_pos];
    }

    (pathname.to_string(), search.to_string(), hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_segment_names_the_page() {
        let url = DocumentUrl::parse("https://example.test/tours/petra.html");
        assert_eq!(url.final_segment("index.html"), "petra.html");
    }

    #[test]
    fn directory_paths_fall_back_to_home() {
        let url = DocumentUrl::parse("https://example.test/");
        assert_eq!(url.final_segment("index.html"), "index.html");

        let url = DocumentUrl::parse("https://example.test/tours/");
        assert_eq!(url.final_segment("index.html"), "index.html");
    }

    #[test]
    fn query_and_fragment_do_not_leak_into_the_segment() {
        let url = DocumentUrl::parse("https://example.test/about.html?ref=nav#team");
        assert_eq!(url.pathname, "/about.html");
        assert_eq!(url.search, "?ref=nav");
        assert_eq!(url.hash, "#team");
        assert_eq!(url.final_segment("index.html"), "about.html");
    }

    #[test]
    fn bare_authority_reads_as_root_path() {
        let url = DocumentUrl::parse("https://example.test");
        assert_eq!(url.pathname, "/");
        assert_eq!(url.final_segment("index.html"), "index.html");
    }
}
