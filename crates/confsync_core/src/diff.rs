use regex::Regex;

/// Reduce storage-format markup to plain text: drop tags with a
/// non-nesting-aware pattern and un-escape ampersands. Good enough for the
/// flat table markup this tool writes; not a general HTML parser.
pub fn strip_markup(body: &str) -> String {
    let tags = Regex::new("<[^<]+?>").expect("tag pattern is valid");
    tags.replace_all(body, "").replace("&amp;", "&")
}

/// Report which known file names do not appear in the page body.
///
/// Plain substring containment against the stripped text. Advisory only:
/// the caller rewrites the page regardless of what is returned.
pub fn missing_files<'a, I>(body: &str, file_names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let cleaned = strip_markup(body);
    file_names
        .into_iter()
        .filter(|name| !cleaned.contains(name))
        .map(ToString::to_string)
        .collect()
}
