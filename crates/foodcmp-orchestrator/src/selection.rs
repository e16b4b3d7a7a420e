use std::cmp::Ordering;

use foodcmp_core::{ItemResult, ProviderReport, SearchRequest};

/// Picks the cheapest item that satisfies `request`.
///
/// Price is the effective (discounted) price. On an exact price tie the
/// higher-rated item wins, with unrated items ranking below any rating. Any
/// remaining tie keeps the item seen first, so provider order decides.
#[must_use]
pub fn select_best_deal<'a>(
    items: impl IntoIterator<Item = &'a ItemResult>,
    request: &SearchRequest,
) -> Option<&'a ItemResult> {
    best_of(items.into_iter().map(|item| ((), item)), request).map(|((), item)| item)
}

/// Like [`select_best_deal`] over the results of `reports`, also returning the
/// index of the report the winner came from.
///
/// Two reports may share a provider id; the index is what identifies the
/// provider instance whose cart the item belongs to.
#[must_use]
pub fn select_best_in_reports<'a>(
    reports: &'a [ProviderReport],
    request: &SearchRequest,
) -> Option<(usize, &'a ItemResult)> {
    let candidates = reports
        .iter()
        .enumerate()
        .flat_map(|(index, report)| report.results.iter().map(move |item| (index, item)));
    best_of(candidates, request)
}

fn best_of<'a, K>(
    candidates: impl IntoIterator<Item = (K, &'a ItemResult)>,
    request: &SearchRequest,
) -> Option<(K, &'a ItemResult)> {
    let mut best: Option<(K, &ItemResult)> = None;
    for (key, item) in candidates {
        if !item.matches(request) {
            continue;
        }
        best = match best {
            Some((current_key, current)) if !beats(item, current) => Some((current_key, current)),
            _ => Some((key, item)),
        };
    }
    best
}

fn beats(candidate: &ItemResult, current: &ItemResult) -> bool {
    match candidate
        .effective_price()
        .total_cmp(&current.effective_price())
    {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => match (candidate.rating, current.rating) {
            (Some(a), Some(b)) => a > b,
            (Some(_), None) => true,
            (None, _) => false,
        },
    }
}
