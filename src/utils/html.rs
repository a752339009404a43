/// Sanitizes rich post bodies with ammonia's whitelist.
///
/// Safe formatting tags (<b>, <p>, links) survive; scripts, iframes and
/// event-handler attributes are stripped. Comments are plain text and are
/// not passed through here.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
