use std::collections::HashSet;

/// Every ancestor directory implied by `path`, most specific first.
///
/// A rooted path yields `/` last. A path with no separator at all has no
/// parent to derive and is returned as-is.
pub fn split_from_path(path: &str) -> impl Iterator<Item = String> + '_ {
    let degenerate = (!path.contains('/')).then(|| path.to_string());

    let mut rest = if degenerate.is_some() {
        ""
    } else if path.len() > 1 && !path.ends_with('/') {
        // Drop the file name, keep its trailing separator.
        &path[..=path.rfind('/').unwrap_or(0)]
    } else {
        path
    };

    let ancestors = std::iter::from_fn(move || {
        let last = rest.rfind('/')?;
        rest = &rest[..last];
        Some(if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        })
    });

    degenerate.into_iter().chain(ancestors)
}

/// Union of [`split_from_path`] over `paths`; each ancestor appears once, in
/// first-seen order.
pub fn split_from_paths<'a, I>(paths: I) -> impl Iterator<Item = String> + 'a
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .flat_map(|path| split_from_path(path))
        .filter(move |dir| seen.insert(dir.clone()))
}
