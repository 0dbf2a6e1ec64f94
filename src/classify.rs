use crate::config::ArcConfig;
use crate::formats::{ChapterKind, Classification, ClassifiedEntry, ListingEntry};

const NO_LABEL: &str = "-";

/// Derives chapter type, arc label and in-arc chapter label from an identifier.
///
/// Side stories (`ss…`) and extras (`ex…`) sit outside any arc. Numeric
/// identifiers are main chapters numbered from `arc.start`, so an identifier
/// below `arc.start` gets a zero or negative number. Anything else is reported
/// as [`ChapterKind::Unclassified`].
pub fn classify(id: &str, arc: &ArcConfig) -> Classification {
    if has_prefix_ignore_case(id, "ss") {
        return unlabeled(ChapterKind::SideStory);
    }
    if has_prefix_ignore_case(id, "ex") {
        return unlabeled(ChapterKind::Extra);
    }

    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        return Classification {
            kind: ChapterKind::Main,
            arc: arc.label.clone(),
            chapter_label: format!("Ch. {}", chapter_number(id, arc.start)),
        };
    }

    Classification {
        kind: ChapterKind::Unclassified,
        arc: arc.label.clone(),
        chapter_label: NO_LABEL.to_owned(),
    }
}

/// `digits - start + 1`, for a non-empty string of ASCII digits of any length.
fn chapter_number(digits: &str, start: u64) -> String {
    if let Ok(ordinal) = digits.parse::<u64>() {
        return (i128::from(ordinal) - i128::from(start) + 1).to_string();
    }

    // Past u64::MAX the ordinal exceeds `start`, so the result is positive.
    let mut out = digits.bytes().map(|b| b - b'0').collect::<Vec<_>>();
    let mut rest = start;
    let mut borrow = 0;
    for digit in out.iter_mut().rev() {
        let sub = (rest % 10) as u8 + borrow;
        rest /= 10;
        if *digit >= sub {
            *digit -= sub;
            borrow = 0;
        } else {
            *digit = *digit + 10 - sub;
            borrow = 1;
        }
    }

    let mut carried = true;
    for digit in out.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            carried = false;
            break;
        }
    }
    if carried {
        out.insert(0, 1);
    }

    let number = out
        .into_iter()
        .skip_while(|digit| *digit == 0)
        .map(|digit| char::from(b'0' + digit))
        .collect::<String>();
    if number.is_empty() {
        "0".to_owned()
    } else {
        number
    }
}

pub fn classify_entries(entries: Vec<ListingEntry>, arc: &ArcConfig) -> Vec<ClassifiedEntry> {
    entries
        .into_iter()
        .map(|entry| {
            let classification = classify(&entry.id, arc);
            ClassifiedEntry {
                entry,
                classification,
            }
        })
        .collect()
}

fn has_prefix_ignore_case(id: &str, prefix: &str) -> bool {
    id.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn unlabeled(kind: ChapterKind) -> Classification {
    Classification {
        kind,
        arc: NO_LABEL.to_owned(),
        chapter_label: NO_LABEL.to_owned(),
    }
}
