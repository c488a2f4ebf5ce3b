//! `pendrive fill` and `pendrive locate` over a page snapshot.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;
use pendrive_client::{CredentialFetcher, HostApi, HttpHost};
use pendrive_core::{AffordanceKind, FormCandidate, Page, locate};
use pendrive_runtime::config::RuntimeConfig;
use pendrive_runtime::content::{ContentContext, NO_FORM_MESSAGE};
use pendrive_runtime::fill::BLOCKED_MESSAGE;

fn load_page(path: &Path) -> anyhow::Result<Page> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read page snapshot {}", path.display()))?;
    Ok(Page::from_json(&json)?)
}

/// Human-readable candidate table.
pub(crate) fn describe_candidates(page: &Page, candidates: &[FormCandidate]) -> String {
    let mut out = String::new();
    if candidates.is_empty() {
        let _ = writeln!(out, "no login forms on {}", page.url);
        return out;
    }
    for c in candidates {
        let container = &page.containers[c.container];
        let label = if container.id.is_empty() {
            format!("#{} ({:?})", c.container, c.kind)
        } else {
            format!("#{} ({:?} \"{}\")", c.container, c.kind, container.id)
        };
        let field_name = |field: Option<pendrive_core::FieldRef>| {
            field
                .and_then(|f| page.field(f))
                .map(|input| {
                    if input.name.is_empty() {
                        format!("[{}]", input.input_type)
                    } else {
                        input.name.clone()
                    }
                })
                .unwrap_or_else(|| "-".to_string())
        };
        let rule = c
            .matched_rule
            .map(|r| format!("{r:?}"))
            .unwrap_or_else(|| "none".to_string());
        let _ = writeln!(
            out,
            "{label}: username={} password={} rule={rule}",
            field_name(c.username_field),
            field_name(c.password_field),
        );
    }
    out
}

/// Which fields now hold a value the fill wrote. Values are never printed.
pub(crate) fn describe_filled(page: &Page) -> Vec<String> {
    page.containers
        .iter()
        .enumerate()
        .flat_map(|(ci, container)| {
            container
                .inputs
                .iter()
                .filter(|input| !input.dispatched.is_empty())
                .map(move |input| {
                    let name = if input.name.is_empty() {
                        &input.input_type
                    } else {
                        &input.name
                    };
                    format!("filled #{ci}/{name}")
                })
        })
        .collect()
}

/// Open a content context over `page`, probe, and fill the first complete
/// form through the in-page fill path.
pub(crate) async fn fill_page<H: HostApi>(
    fetcher: CredentialFetcher<H>,
    page: Page,
    config: &RuntimeConfig,
) -> anyhow::Result<ContentContext<H>> {
    let mut ctx = ContentContext::new(fetcher, page, config.domain_match);
    if !ctx.init().await.is_available() {
        anyhow::bail!(BLOCKED_MESSAGE);
    }
    let container = ctx
        .candidates()
        .iter()
        .find(|c| c.is_complete())
        .or_else(|| ctx.candidates().first())
        .map(|c| c.container);
    let Some(container) = container else {
        anyhow::bail!(NO_FORM_MESSAGE);
    };

    if ctx.click_fill_button(container).await.is_none() {
        let reason = ctx
            .page()
            .affordances()
            .iter()
            .rev()
            .find_map(|a| match &a.kind {
                AffordanceKind::Toast { message, .. } => Some(message.clone()),
                AffordanceKind::FillButton { .. } => None,
            })
            .unwrap_or_else(|| "fill failed".to_string());
        anyhow::bail!(reason);
    }
    Ok(ctx)
}

pub async fn cmd_fill(config: &RuntimeConfig, path: &Path) -> anyhow::Result<()> {
    let page = load_page(path)?;
    let host = HttpHost::new(&config.host_url, config.request_timeout)?;
    let ctx = fill_page(CredentialFetcher::new(host), page, config).await?;

    print!("{}", describe_candidates(ctx.page(), ctx.candidates()));
    for line in describe_filled(ctx.page()) {
        println!("{line}");
    }
    Ok(())
}

pub fn cmd_locate(path: &Path) -> anyhow::Result<()> {
    let page = load_page(path)?;
    let candidates = locate(&page);
    print!("{}", describe_candidates(&page, &candidates));
    Ok(())
}
