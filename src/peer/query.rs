use url::form_urlencoded;

/// Encodes `key=value` pairs into a query string for [`Peer::url`](super::Peer::url).
///
/// Returns `None` when there are no pairs, so no `?` ends up in the URL.
pub fn encode_query<I, K, V>(pairs: I) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
        any = true;
    }
    any.then(|| serializer.finish())
}
