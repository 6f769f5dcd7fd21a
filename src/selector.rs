use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) combinator: Option<SelectorCombinator>,
    pub(crate) step: SelectorStep,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let mut groups = Vec::new();
    for part in split_top_level(selector, ',')? {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        groups.push(parse_selector_chain(trimmed)?);
    }
    if groups.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(groups)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let mut parts = Vec::new();
    let mut pending_combinator = None;

    for token in tokenize_chain(selector)? {
        match token {
            ChainToken::Child => {
                if pending_combinator.is_some() || parts.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.to_string()));
                }
                pending_combinator = Some(SelectorCombinator::Child);
            }
            ChainToken::Compound(compound) => {
                let combinator = if parts.is_empty() {
                    None
                } else {
                    Some(pending_combinator.take().unwrap_or(SelectorCombinator::Descendant))
                };
                parts.push(SelectorPart {
                    combinator,
                    step: parse_selector_step(&compound)?,
                });
            }
        }
    }

    if parts.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(parts)
}

enum ChainToken {
    Compound(String),
    Child,
}

fn tokenize_chain(selector: &str) -> Result<Vec<ChainToken>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(active) = quote {
            current.push(ch);
            if ch == active {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if in_brackets => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                if in_brackets {
                    return Err(Error::UnsupportedSelector(selector.to_string()));
                }
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                if !in_brackets {
                    return Err(Error::UnsupportedSelector(selector.to_string()));
                }
                in_brackets = false;
                current.push(ch);
            }
            '>' if !in_brackets => {
                if !current.is_empty() {
                    tokens.push(ChainToken::Compound(std::mem::take(&mut current)));
                }
                tokens.push(ChainToken::Child);
            }
            ch if ch.is_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    tokens.push(ChainToken::Compound(std::mem::take(&mut current)));
                }
            }
            _ => current.push(ch),
        }
    }

    if in_brackets || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    if !current.is_empty() {
        tokens.push(ChainToken::Compound(current));
    }
    Ok(tokens)
}

fn split_top_level(selector: &str, separator: char) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(active) = quote {
            current.push(ch);
            if ch == active {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if in_brackets => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            ch if ch == separator && !in_brackets => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if in_brackets || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    parts.push(current);
    Ok(parts)
}

fn parse_selector_step(compound: &str) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    let chars: Vec<char> = compound.chars().collect();
    let mut i = 0usize;

    if i < chars.len() && chars[i] == '*' {
        step.universal = true;
        i += 1;
    } else if i < chars.len() && is_ident_start(chars[i]) {
        let start = i;
        while i < chars.len() && is_ident_char(chars[i]) {
            i += 1;
        }
        step.tag = Some(chars[start..i].iter().collect::<String>().to_ascii_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                if start == i {
                    return Err(Error::UnsupportedSelector(compound.to_string()));
                }
                step.id = Some(chars[start..i].iter().collect());
            }
            '.' => {
                i += 1;
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                if start == i {
                    return Err(Error::UnsupportedSelector(compound.to_string()));
                }
                step.classes.push(chars[start..i].iter().collect());
            }
            '[' => {
                let (condition, next) = parse_attr_condition(compound, &chars, i)?;
                step.attrs.push(condition);
                i = next;
            }
            _ => return Err(Error::UnsupportedSelector(compound.to_string())),
        }
    }

    if !step.universal
        && step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
    {
        return Err(Error::UnsupportedSelector(compound.to_string()));
    }
    Ok(step)
}

fn parse_attr_condition(
    compound: &str,
    chars: &[char],
    at: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let mut i = at + 1;

    let name_start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    if name_start == i {
        return Err(Error::UnsupportedSelector(compound.to_string()));
    }
    let key: String = chars[name_start..i].iter().collect::<String>().to_ascii_lowercase();

    if i < chars.len() && chars[i] == ']' {
        return Ok((SelectorAttrCondition::Exists { key }, i + 1));
    }

    let prefix_match = i < chars.len() && chars[i] == '^';
    if prefix_match {
        i += 1;
    }
    if i >= chars.len() || chars[i] != '=' {
        return Err(Error::UnsupportedSelector(compound.to_string()));
    }
    i += 1;

    let value = if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
        let active = chars[i];
        i += 1;
        let start = i;
        while i < chars.len() && chars[i] != active {
            i += 1;
        }
        if i >= chars.len() {
            return Err(Error::UnsupportedSelector(compound.to_string()));
        }
        let value: String = chars[start..i].iter().collect();
        i += 1;
        value
    } else {
        let start = i;
        while i < chars.len() && chars[i] != ']' {
            i += 1;
        }
        chars[start..i].iter().collect()
    };

    if i >= chars.len() || chars[i] != ']' {
        return Err(Error::UnsupportedSelector(compound.to_string()));
    }
    i += 1;

    let condition = if prefix_match {
        SelectorAttrCondition::StartsWith { key, value }
    } else {
        SelectorAttrCondition::Eq { key, value }
    };
    Ok((condition, i))
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_descendant_chain() -> Result<()> {
        let groups = parse_selector_groups("nav ul li a")?;
        assert_eq!(groups.len(), 1);
        let chain = &groups[0];
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0].combinator, None);
        assert_eq!(chain[1].combinator, Some(SelectorCombinator::Descendant));
        assert_eq!(chain[3].step.tag.as_deref(), Some("a"));
        Ok(())
    }

    #[test]
    fn parses_comma_groups_with_classes() -> Result<()> {
        let groups = parse_selector_groups(".gallery-item img, .thumb img")?;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][0].step.classes, vec!["gallery-item".to_string()]);
        assert_eq!(groups[1][0].step.classes, vec!["thumb".to_string()]);
        Ok(())
    }

    #[test]
    fn parses_attribute_prefix_condition() -> Result<()> {
        let groups = parse_selector_groups(r##"a[href^="#"]"##)?;
        let step = &groups[0][0].step;
        assert_eq!(step.tag.as_deref(), Some("a"));
        assert_eq!(
            step.attrs,
            vec![SelectorAttrCondition::StartsWith {
                key: "href".to_string(),
                value: "#".to_string(),
            }]
        );
        Ok(())
    }

    #[test]
    fn id_only_fast_path_detection() -> Result<()> {
        let groups = parse_selector_groups("#feedbackForm")?;
        assert_eq!(groups[0][0].step.id_only(), Some("feedbackForm"));
        let groups = parse_selector_groups("form#feedbackForm")?;
        assert_eq!(groups[0][0].step.id_only(), None);
        Ok(())
    }

    #[test]
    fn rejects_pseudo_classes() {
        let err = parse_selector_groups("li:first-child").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSelector(_)));
    }

    #[test]
    fn rejects_dangling_combinator() {
        let err = parse_selector_groups("nav >").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSelector(_)));
    }
}
