//! Suggested-rewrite transform.
//!
//! Pipeline, applied to the trimmed message:
//!
//!   1. soften flagged marketing phrases
//!   2. normalize links (shorteners -> branded placeholder, http -> https)
//!   3. append HELP and STOP boilerplate when missing
//!   4. fit the limit by truncating the body, never the boilerplate
//!
//! The output depends only on the message and the ruleset's rewrite policy.

use regex::{Captures, NoExpand};

use crate::rules::catalog::{RewritePolicy, RuleSet};
use crate::signals::extract::LINK;
use crate::util::text::{char_len, truncate_words};

/// Produces a cleaned-up version of `message`.
///
/// Guarantees: the result contains whole-word STOP and HELP and is at most
/// `policy.limit` characters long.
pub fn rewrite(message: &str, rules: &RuleSet) -> String {
    let policy = &rules.rewrite;

    let body = soften(message.trim(), policy);
    let body = normalize_links(&body, policy);

    let full = with_boilerplate(&body, policy);
    if char_len(&full) <= policy.limit {
        return full;
    }
    fit(&body, policy)
}

pub fn soften(text: &str, policy: &RewritePolicy) -> String {
    let mut out = text.to_string();
    for s in &policy.softening {
        let softened = s.regex.replace_all(&out, NoExpand(&s.replacement)).into_owned();
        out = softened;
    }
    out
}

pub fn normalize_links(text: &str, policy: &RewritePolicy) -> String {
    let linked = LINK.replace_all(text, |caps: &Captures| {
        let url = &caps[0];
        if policy.shortener.is_match(url) {
            policy.placeholder_url.clone()
        } else {
            upgrade_scheme(url)
        }
    });

    let out = policy
        .bare_shortener
        .replace_all(&linked, NoExpand(&policy.placeholder_url))
        .into_owned();
    out
}

fn upgrade_scheme(url: &str) -> String {
    match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => format!("https://{}", &url[7..]),
        _ => url.to_string(),
    }
}

fn with_boilerplate(body: &str, policy: &RewritePolicy) -> String {
    let mut out = body.to_string();

    if !policy.help.is_match(&out) {
        if !out.is_empty() && !is_terminated(&out, &policy.ellipsis) {
            out.push('.');
        }
        push_line(&mut out, &policy.help_line);
    }
    if !policy.stop.is_match(&out) {
        push_line(&mut out, &policy.stop_line);
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(line);
}

fn is_terminated(text: &str, ellipsis: &str) -> bool {
    text.ends_with(['.', '!', '?']) || text.ends_with(ellipsis)
}

/// Shrinks the body until body plus boilerplate fits the limit.
///
/// Truncation can remove a HELP or STOP the body already had, which makes
/// the boilerplate longer, so the budget is recomputed until it settles.
fn fit(body: &str, policy: &RewritePolicy) -> String {
    let mut budget = policy.limit.saturating_sub(boilerplate_len(body, policy));

    loop {
        let truncated = truncate_words(body, budget, &policy.ellipsis);
        let out = with_boilerplate(&truncated, policy);
        let len = char_len(&out);
        if len <= policy.limit || budget == 0 {
            return out;
        }

        let needed = policy.limit.saturating_sub(len - char_len(&truncated));
        budget = needed.min(budget - 1);
    }
}

fn boilerplate_len(body: &str, policy: &RewritePolicy) -> usize {
    char_len(&with_boilerplate(body, policy)) - char_len(body)
}
