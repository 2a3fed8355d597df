//! One extraction routine per known export file.
//!
//! Files with a stable layout are read field by field. Files whose records
//! nest inconsistently (posts, comments, reactions, searches) are flattened
//! per record and read with substring lookups.

use crate::denest::{stringify, Flattener};
use crate::error::ExtractError;
use crate::facebook::source::ExportSource;
use crate::facebook::guarded;
use crate::text::fix_latin1;
use crate::timestamp::{epoch_str_to_iso, epoch_to_iso};
use crate::types::{ExtractConfig, Table};
use anyhow::Result;
use serde_json::Value;

pub(crate) fn load(source: &dyn ExportSource, file_name: &str) -> Result<Value> {
    source
        .read_json(file_name)
        .ok_or_else(|| ExtractError::MissingFile(file_name.to_string()).into())
}

pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| ExtractError::MissingField(key.to_string()).into())
}

pub(crate) fn items<'a>(value: &'a Value, key: &str) -> Result<&'a [Value]> {
    field(value, key)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ExtractError::MissingField(key.to_string()).into())
}

/// Repaired text of an optional field
fn text(item: &Value, key: &str) -> Value {
    Value::String(item.get(key).map(|v| fix_latin1(&stringify(v))).unwrap_or_default())
}

/// Text of an optional field, as-is
fn raw(item: &Value, key: &str) -> Value {
    Value::String(item.get(key).map(stringify).unwrap_or_default())
}

/// ISO timestamp of an optional epoch field
fn timestamp(item: &Value, key: &str) -> Value {
    Value::String(item.get(key).map(epoch_to_iso).unwrap_or_default())
}

fn found(flat_value: String) -> Value {
    Value::String(fix_latin1(&flat_value))
}

/// Name/title plus timestamp, one row per item; the shape shared by most simple files
/// `outer` and `inner` joined the way the flattener joins path segments
fn nested_key(config: &ExtractConfig, outer: &str, inner: &str) -> String {
    format!("{}{}{}", outer, config.separator, inner)
}

fn titled_timestamps(
    source: &dyn ExportSource,
    template: Table,
    file_name: &str,
    root_key: &str,
    name_key: &str,
) -> Table {
    let time_column = template.columns[template.columns.len() - 1].clone();
    guarded(template, |mut table| {
        let d = load(source, file_name)?;
        for item in items(&d, root_key)? {
            table.push_row(vec![text(item, name_key), timestamp(item, "timestamp")])?;
        }
        table.sort_by_timestamp(&time_column);
        Ok(table)
    })
}

pub fn who_youve_followed(source: &dyn ExportSource) -> Table {
    titled_timestamps(
        source,
        Table::new("who_youve_followed", "Who you've followed", &["Name", "Timestamp"]),
        "who_you've_followed.json",
        "following_v3",
        "name",
    )
}

pub fn your_friends(source: &dyn ExportSource) -> Table {
    let template = Table::new("your_friends", "Your friends", &["Number of friends"]);
    guarded(template, |mut table| {
        let d = load(source, "your_friends.json")?;
        let friends = items(&d, "friends_v2")?;
        table.push_row(vec![Value::from(friends.len())])?;
        Ok(table)
    })
}

pub fn ads_interests(source: &dyn ExportSource) -> Table {
    let template = Table::new("ads_interests", "Ads interests", &["Ad"]);
    guarded(template, |mut table| {
        let d = load(source, "ads_interests.json")?;
        for topic in items(&d, "topics_v2")? {
            table.push_row(vec![found(stringify(topic))])?;
        }
        Ok(table)
    })
}

fn viewed_entries(table: &mut Table, group: &Value) -> Result<()> {
    let Some(entries) = group.get("entries").and_then(Value::as_array) else {
        return Ok(());
    };
    for entry in entries {
        let data = entry.get("data").unwrap_or(&Value::Null);
        table.push_row(vec![
            text(group, "name"),
            text(data, "name"),
            raw(data, "uri"),
            timestamp(entry, "timestamp"),
        ])?;
    }
    Ok(())
}

pub fn recently_viewed(source: &dyn ExportSource) -> Table {
    let template = Table::new("recently_viewed", "Recently viewed", &["Watched", "Name", "Link", "Date"]);
    guarded(template, |mut table| {
        let d = load(source, "recently_viewed.json")?;
        for item in items(&d, "recently_viewed")? {
            viewed_entries(&mut table, item)?;
            // some categories nest one level deeper
            if let Some(children) = item.get("children").and_then(Value::as_array) {
                for child in children {
                    viewed_entries(&mut table, child)?;
                }
            }
        }
        table.sort_by_timestamp("Date");
        Ok(table)
    })
}

pub fn recently_visited(source: &dyn ExportSource) -> Table {
    let template = Table::new("recently_visited", "Recently visited", &["Watched", "Name", "Link", "Date"]);
    guarded(template, |mut table| {
        let d = load(source, "recently_visited.json")?;
        for item in items(&d, "visited_things_v2")? {
            viewed_entries(&mut table, item)?;
        }
        table.sort_by_timestamp("Date");
        Ok(table)
    })
}

pub fn profile_information(source: &dyn ExportSource) -> Table {
    let template = Table::new(
        "profile_information",
        "Profile information",
        &["Gender", "Pronoun", "Custom genders"],
    );
    guarded(template, |mut table| {
        let d = load(source, "profile_information.json")?;
        let profile = field(&d, "profile_v2")?;
        let gender = profile.get("gender").unwrap_or(&Value::Null);
        let custom = gender
            .get("custom_genders")
            .and_then(Value::as_array)
            .map(|genders| genders.iter().map(stringify).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();

        table.push_row(vec![
            raw(gender, "gender_option"),
            raw(gender, "pronoun"),
            Value::String(custom),
        ])?;
        Ok(table)
    })
}

pub fn profile_update_history(source: &dyn ExportSource) -> Table {
    titled_timestamps(
        source,
        Table::new("profile_update_history", "Profile update history", &["Title", "Timestamp"]),
        "profile_update_history.json",
        "profile_updates_v2",
        "title",
    )
}

pub fn your_event_responses(source: &dyn ExportSource) -> Table {
    let template = Table::new("your_event_responses", "Your event responses", &["Name", "Timestamp"]);
    guarded(template, |mut table| {
        let d = load(source, "your_event_responses.json")?;
        for item in items(field(&d, "event_responses_v2")?, "events_joined")? {
            table.push_row(vec![text(item, "name"), timestamp(item, "start_timestamp")])?;
        }
        table.sort_by_timestamp("Timestamp");
        Ok(table)
    })
}

pub fn group_posts_and_comments(source: &dyn ExportSource, config: &ExtractConfig) -> Table {
    let template = Table::new(
        "group_posts_and_comments",
        "Group posts and comments",
        &["Title", "Post", "Date", "Url"],
    );
    let flattener = Flattener::new(config);
    guarded(template, |mut table| {
        let d = load(source, "group_posts_and_comments.json")?;
        for item in items(&d, "group_posts_v2")? {
            let flat = flattener.flatten(item);
            table.push_row(vec![
                found(flat.find_item("title")),
                found(flat.find_item("post")),
                Value::String(epoch_str_to_iso(&flat.find_item("timestamp"))),
                Value::String(flat.find_item("url")),
            ])?;
        }
        table.sort_by_timestamp("Date");
        Ok(table)
    })
}

pub fn your_answers_to_membership_questions(source: &dyn ExportSource) -> Table {
    let template = Table::new(
        "your_answers_to_membership_questions",
        "Your answers to membership questions",
        &["Group name"],
    );
    guarded(template, |mut table| {
        let d = load(source, "your_answers_to_membership_questions.json")?;
        let answers = field(&d, "group_membership_questions_answers_v2")?;
        for item in items(answers, "group_answers")? {
            table.push_row(vec![text(item, "group_name")])?;
        }
        Ok(table)
    })
}

pub fn your_comments_in_groups(source: &dyn ExportSource, config: &ExtractConfig) -> Table {
    let template = Table::new(
        "your_comments_in_groups",
        "Your comments in groups",
        &["Title", "Comment", "Group", "Timestamp"],
    );
    let flattener = Flattener::new(config);
    let comment_key = nested_key(config, "comment", "comment");
    guarded(template, |mut table| {
        let d = load(source, "your_comments_in_groups.json")?;
        for item in items(&d, "group_comments_v2")? {
            let flat = flattener.flatten(item);
            table.push_row(vec![
                found(flat.find_item("title")),
                found(flat.find_item(&comment_key)),
                found(flat.find_item("group")),
                Value::String(epoch_str_to_iso(&flat.find_item("timestamp"))),
            ])?;
        }
        table.sort_by_timestamp("Timestamp");
        Ok(table)
    })
}

pub fn your_group_membership_activity(source: &dyn ExportSource, config: &ExtractConfig) -> Table {
    let template = Table::new(
        "your_group_membership_activity",
        "Your group membership activity",
        &["Title", "Group name", "Timestamp"],
    );
    let flattener = Flattener::new(config);
    guarded(template, |mut table| {
        let d = load(source, "your_group_membership_activity.json")?;
        for item in items(&d, "groups_joined_v2")? {
            let flat = flattener.flatten(item);
            table.push_row(vec![
                found(flat.find_item("title")),
                found(flat.find_item("name")),
                Value::String(epoch_str_to_iso(&flat.find_item("timestamp"))),
            ])?;
        }
        table.sort_by_timestamp("Timestamp");
        Ok(table)
    })
}

pub fn pages_and_profiles_you_follow(source: &dyn ExportSource) -> Table {
    titled_timestamps(
        source,
        Table::new(
            "pages_and_profiles_you_follow",
            "Pages and profiles you follow",
            &["Title", "Timestamp"],
        ),
        "pages_and_profiles_you_follow.json",
        "pages_followed_v2",
        "title",
    )
}

/// Name, url and timestamp per item
fn named_links(source: &dyn ExportSource, template: Table, file_name: &str, root_key: &str) -> Table {
    guarded(template, |mut table| {
        let d = load(source, file_name)?;
        for item in items(&d, root_key)? {
            table.push_row(vec![text(item, "name"), raw(item, "url"), timestamp(item, "timestamp")])?;
        }
        table.sort_by_timestamp("Timestamp");
        Ok(table)
    })
}

pub fn pages_youve_liked(source: &dyn ExportSource) -> Table {
    named_links(
        source,
        Table::new("pages_youve_liked", "Pages you've liked", &["Name", "Url", "Timestamp"]),
        "pages_you've_liked.json",
        "page_likes_v2",
    )
}

pub fn your_pages(source: &dyn ExportSource) -> Table {
    named_links(
        source,
        Table::new("your_pages", "Your pages", &["Name", "Url", "Timestamp"]),
        "your_pages.json",
        "pages_v2",
    )
}

pub fn your_saved_items(source: &dyn ExportSource) -> Table {
    titled_timestamps(
        source,
        Table::new("your_saved_items", "Your saved items", &["Title", "Timestamp"]),
        "your_saved_items.json",
        "saves_v2",
        "title",
    )
}

/// Title, a free-text field found by `text_key`, and timestamp, from flattened records
fn flattened_texts(
    source: &dyn ExportSource,
    config: &ExtractConfig,
    template: Table,
    file_name: &str,
    root_key: &str,
    text_key: &str,
) -> Table {
    let flattener = Flattener::new(config);
    guarded(template, |mut table| {
        let d = load(source, file_name)?;
        for item in items(&d, root_key)? {
            let flat = flattener.flatten(item);
            table.push_row(vec![
                found(flat.find_item("title")),
                found(flat.find_item(text_key)),
                Value::String(epoch_str_to_iso(&flat.find_item("timestamp"))),
            ])?;
        }
        table.sort_by_timestamp("Timestamp");
        Ok(table)
    })
}

pub fn your_search_history(source: &dyn ExportSource, config: &ExtractConfig) -> Table {
    flattened_texts(
        source,
        config,
        Table::new("your_search_history", "Your search history", &["Title", "Text", "Timestamp"]),
        "your_search_history.json",
        "searches_v2",
        "text",
    )
}

pub fn comments(source: &dyn ExportSource, config: &ExtractConfig) -> Table {
    flattened_texts(
        source,
        config,
        Table::new("comments", "Comments", &["Title", "Comment", "Timestamp"]),
        "comments.json",
        "comments_v2",
        &nested_key(config, "comment", "comment"),
    )
}

/// Reactions are spread over `likes_and_reactions_1.json`, `_2`, ... up to the first gap
pub fn likes_and_reactions(source: &dyn ExportSource, config: &ExtractConfig) -> Table {
    let template = Table::new(
        "likes_and_reactions",
        "Likes and reactions",
        &["Title", "Reaction", "Timestamp"],
    );
    let flattener = Flattener::new(config);
    let reaction_key = nested_key(config, "reaction", "reaction");
    guarded(template, |mut table| {
        let first = "likes_and_reactions_1.json";
        let mut index = 1;
        let mut d = Some(load(source, first)?);

        while let Some(file) = d {
            let records = file
                .as_array()
                .ok_or_else(|| ExtractError::MissingField(format!("likes_and_reactions_{}", index)))?;
            for item in records {
                let flat = flattener.flatten(item);
                table.push_row(vec![
                    found(flat.find_item("title")),
                    found(flat.find_item(&reaction_key)),
                    Value::String(epoch_str_to_iso(&flat.find_item("timestamp"))),
                ])?;
            }
            index += 1;
            d = source.read_json(&format!("likes_and_reactions_{}.json", index));
        }

        table.sort_by_timestamp("Timestamp");
        Ok(table)
    })
}

pub fn your_comment_active_days(source: &dyn ExportSource) -> Table {
    let template = Table::new("your_comment_active_days", "Your comment active days", &["Label", "Value"]);
    guarded(template, |mut table| {
        let d = load(source, "your_comment_active_days.json")?;
        for item in items(&d, "label_values")? {
            let value = item
                .get("value")
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            table.push_row(vec![raw(item, "label"), value])?;
        }
        Ok(table)
    })
}

/// Every table routine, in display order
pub fn all_tables(source: &dyn ExportSource, config: &ExtractConfig) -> Vec<Table> {
    vec![
        who_youve_followed(source),
        your_friends(source),
        ads_interests(source),
        recently_viewed(source),
        recently_visited(source),
        profile_information(source),
        profile_update_history(source),
        likes_and_reactions(source, config),
        your_event_responses(source),
        group_posts_and_comments(source, config),
        your_answers_to_membership_questions(source),
        your_comments_in_groups(source, config),
        your_group_membership_activity(source, config),
        pages_and_profiles_you_follow(source),
        pages_youve_liked(source),
        your_saved_items(source),
        your_search_history(source, config),
        comments(source, config),
        your_comment_active_days(source),
        your_pages(source),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn source(files: &[(&str, Value)]) -> HashMap<String, Value> {
        files
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_group_posts_use_shallowest_fields_and_sort() {
        let files = source(&[(
            "group_posts_and_comments.json",
            json!({"group_posts_v2": [
                {
                    "timestamp": 1609459200,
                    "title": "Jane posted in Rustaceans.",
                    "data": [{"post": "Hello group"}],
                    "attachments": [{"data": [{"external_context": {"url": "https://a.test"}}]}]
                },
                {
                    "timestamp": 1640995200,
                    "title": "Jane posted in Gophers.",
                    "data": [{"post": "caf\u{00c3}\u{00a9}"}]
                }
            ]}),
        )]);
        let table = group_posts_and_comments(&files, &ExtractConfig::default());

        assert_eq!(table.columns, vec!["Title", "Post", "Date", "Url"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0],
            vec![json!("Jane posted in Gophers."), json!("café"), json!("2022-01-01T00:00:00+00:00"), json!("")]
        );
        assert_eq!(table.rows[1][3], "https://a.test");
    }

    #[test]
    fn test_missing_file_gives_empty_table() {
        let table = comments(&HashMap::new(), &ExtractConfig::default());
        assert!(table.is_empty());
        assert_eq!(table.id, "comments");
        assert_eq!(table.columns, vec!["Title", "Comment", "Timestamp"]);
    }

    #[test]
    fn test_malformed_file_gives_empty_table() {
        let files = source(&[("who_you've_followed.json", json!({"following_v3": "oops"}))]);
        assert!(who_youve_followed(&files).is_empty());

        let files = source(&[("your_friends.json", json!([1, 2, 3]))]);
        assert!(your_friends(&files).is_empty());
    }

    #[test]
    fn test_simple_file_with_missing_fields() {
        let files = source(&[(
            "who_you've_followed.json",
            json!({"following_v3": [
                {"name": "Old Page", "timestamp": 1500000000},
                {"name": "Undated Page"},
                {"name": "New Page", "timestamp": 1600000000}
            ]}),
        )]);
        let table = who_youve_followed(&files);
        let names: Vec<_> = table.column_cells("Name").cloned().collect();
        assert_eq!(names, vec![json!("New Page"), json!("Old Page"), json!("Undated Page")]);
        assert_eq!(table.rows[2][1], "");
    }

    #[test]
    fn test_your_friends_counts() {
        let files = source(&[("your_friends.json", json!({"friends_v2": [{}, {}, {}]}))]);
        let table = your_friends(&files);
        assert_eq!(table.rows, vec![vec![json!(3)]]);
    }

    #[test]
    fn test_recently_viewed_includes_children() {
        let files = source(&[(
            "recently_viewed.json",
            json!({"recently_viewed": [
                {
                    "name": "Videos",
                    "entries": [{"timestamp": 1500000000, "data": {"name": "Clip", "uri": "https://v.test/1"}}]
                },
                {
                    "name": "Marketplace",
                    "children": [{
                        "name": "Items",
                        "entries": [{"timestamp": 1600000000, "data": {"name": "Bike", "uri": "https://m.test/2"}}]
                    }]
                }
            ]}),
        )]);
        let table = recently_viewed(&files);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], "Items");
        assert_eq!(table.rows[0][1], "Bike");
        assert_eq!(table.rows[1][2], "https://v.test/1");
    }

    #[test]
    fn test_likes_and_reactions_reads_numbered_files() {
        let files = source(&[
            (
                "likes_and_reactions_1.json",
                json!([{"timestamp": 1500000000, "title": "Jane likes Bob's post.", "data": [{"reaction": {"reaction": "LIKE", "actor": "Jane"}}]}]),
            ),
            (
                "likes_and_reactions_2.json",
                json!([{"timestamp": 1600000000, "title": "Jane reacted to Ann's photo.", "data": [{"reaction": {"reaction": "WOW"}}]}]),
            ),
            (
                "likes_and_reactions_4.json",
                json!([{"timestamp": 1700000000, "title": "skipped", "data": []}]),
            ),
        ]);
        let table = likes_and_reactions(&files, &ExtractConfig::default());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], "WOW");
        assert_eq!(table.rows[1][1], "LIKE");
    }

    #[test]
    fn test_nested_text_with_custom_separator() {
        let config = ExtractConfig {
            separator: ".".to_string(),
            ..ExtractConfig::default()
        };
        let files = source(&[
            (
                "comments.json",
                json!({"comments_v2": [{"title": "c", "data": [{"comment": {"comment": "hello"}}]}]}),
            ),
            (
                "your_comments_in_groups.json",
                json!({"group_comments_v2": [{"title": "g", "data": [{"comment": {"comment": "hi group", "group": "Rustaceans"}}]}]}),
            ),
            (
                "likes_and_reactions_1.json",
                json!([{"title": "r", "data": [{"reaction": {"reaction": "LOVE"}}]}]),
            ),
        ]);

        assert_eq!(comments(&files, &config).rows[0][1], "hello");
        let groups = your_comments_in_groups(&files, &config);
        assert_eq!(groups.rows[0][1], "hi group");
        assert_eq!(groups.rows[0][2], "Rustaceans");
        assert_eq!(likes_and_reactions(&files, &config).rows[0][1], "LOVE");
    }

    #[test]
    fn test_profile_information() {
        let files = source(&[(
            "profile_information.json",
            json!({"profile_v2": {"gender": {"gender_option": "CUSTOM", "pronoun": "THEY", "custom_genders": ["a", "b"]}}}),
        )]);
        let table = profile_information(&files);
        assert_eq!(table.rows, vec![vec![json!("CUSTOM"), json!("THEY"), json!("a, b")]]);
    }

    #[test]
    fn test_comment_active_days_keeps_value_type() {
        let files = source(&[(
            "your_comment_active_days.json",
            json!({"label_values": [{"label": "Days", "value": 12}, {"label": "Missing"}]}),
        )]);
        let table = your_comment_active_days(&files);
        assert_eq!(table.rows[0], vec![json!("Days"), json!(12)]);
        assert_eq!(table.rows[1], vec![json!("Missing"), json!("")]);
    }

    #[test]
    fn test_all_tables_on_empty_export() {
        let tables = all_tables(&HashMap::new(), &ExtractConfig::default());
        assert_eq!(tables.len(), 20);
        assert!(tables.iter().all(Table::is_empty));
    }
}
