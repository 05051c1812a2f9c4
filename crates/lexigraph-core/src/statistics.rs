//! Word-usage statistics.
//!
//! Backends count word rows per `(surface form, syntactic-role description)`
//! pair and hand the flat counts to [`group`], which folds them into one
//! [`WordStatistics`] per surface form. The result is always in ascending
//! order of surface form; within a word, roles keep the order the backend
//! produced them in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How often a word occurs in one syntactic role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
  pub syntactic_role_description: String,
  pub count:                      u64,
}

/// All roles a surface form was seen in, with counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStatistics {
  pub word:       String,
  pub statistics: Vec<RoleCount>,
}

/// One aggregated row as produced by a backend's grouping query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticRow {
  pub word:             String,
  pub role_description: String,
  pub count:            u64,
}

/// Group flat `(word, role, count)` rows by word, ascending by word.
pub fn group(rows: impl IntoIterator<Item = StatisticRow>) -> Vec<WordStatistics> {
  let mut grouped: BTreeMap<String, Vec<RoleCount>> = BTreeMap::new();
  for row in rows {
    grouped.entry(row.word).or_default().push(RoleCount {
      syntactic_role_description: row.role_description,
      count:                      row.count,
    });
  }
  grouped
    .into_iter()
    .map(|(word, statistics)| WordStatistics { word, statistics })
    .collect()
}

/// Statistics for a single surface form. Rows for other words are ignored;
/// an unseen word yields an empty role list.
pub fn for_word(word: &str, rows: impl IntoIterator<Item = StatisticRow>) -> WordStatistics {
  WordStatistics {
    word:       word.to_owned(),
    statistics: rows
      .into_iter()
      .filter(|row| row.word == word)
      .map(|row| RoleCount {
        syntactic_role_description: row.role_description,
        count:                      row.count,
      })
      .collect(),
  }
}
