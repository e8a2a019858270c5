//! Prompt text for players and the judge.
//!
//! Every request is the shared rules frame plus a task-specific context.
//! Tag names stay in English regardless of the response language, since
//! the extractor matches them literally.

use crate::PlayerId;
use indexmap::IndexMap;

/// Wrap a task context in the rules frame, addressed to `name` acting as `role`
pub fn frame(name: &str, role: &str, language: &str, context: &str) -> String {
    format!(
        "Hi, {name}. You are {role} in a Liar Game. Every player is given the same topic except \
one player, the liar, who receives a different but related topic. Players take turns offering \
one word about their topic. The regular players try to identify the liar; the liar tries to \
blend in without knowing the main topic.

Keep your answer clear and direct, and write it in {language}. Wrap answers in XML tags exactly \
as requested, e.g. <word>sunny</word> for a word or <target>Player Name</target> for a vote. \
Keep the tag names themselves in English.

{context}

Please provide your response:"
    )
}

pub fn word_context(topic: &str, previous_words: &[String]) -> String {
    let shared = if previous_words.is_empty() {
        "None".to_string()
    } else {
        previous_words.join(", ")
    };

    format!(
        "The topic is: {topic}
Words shared by other players so far: {shared}

Provide ONE descriptive word related to the topic. The word must not be part of the topic itself.
You might be the liar! If the other words do not fit your topic, pick a word that blends in.
Use <word>your_word</word> and explain your choice in <reason>...</reason>."
    )
}

pub fn vote_context(all_words: &IndexMap<PlayerId, String>, topic: &str) -> String {
    format!(
        "Time to vote! Your topic was: {topic}

Words given by each player:
{words}

Who do you think is the liar? Do not vote for yourself. Answer with the player's name in \
<target>player_name</target> and explain in <reason>...</reason>.",
        words = word_lines(all_words),
    )
}

pub fn topic_context(genre: &str, previous_topics: &[String]) -> String {
    let used = if previous_topics.is_empty() {
        "none yet".to_string()
    } else {
        previous_topics.join(", ")
    };

    format!(
        "Generate two related but different topics for a Liar Game.
The genre is: {genre}

The topics should be:
1. Similar enough that some descriptive words apply to both
2. Different enough that specific words only apply to one

Respond in this format:
<main_topic>topic1</main_topic>
<liar_topic>topic2</liar_topic>

Be creative, and do not reuse any of these previously used topics: {used}"
    )
}

pub fn evaluation_context(
    all_words: &IndexMap<PlayerId, String>,
    liar: &str,
    votes: &IndexMap<PlayerId, String>,
) -> String {
    let vote_lines = votes
        .iter()
        .map(|(voter, target)| format!("{}: voted for {}", voter, target))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "The round is over. The true liar was: {liar}

Words given:
{words}

Votes cast:
{vote_lines}

Comment briefly on how the liar played and how well the group reasoned. \
Put your commentary in <analysis>...</analysis>.",
        words = word_lines(all_words),
    )
}

fn word_lines(all_words: &IndexMap<PlayerId, String>) -> String {
    all_words
        .iter()
        .map(|(player, word)| format!("{}: {}", player, word))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_context_lists_previous_words_in_order() {
        let context = word_context("ocean", &["wave".into(), "salt".into()]);
        assert!(context.contains("The topic is: ocean"));
        assert!(context.contains("so far: wave, salt"));

        let context = word_context("ocean", &[]);
        assert!(context.contains("so far: None"));
    }

    #[test]
    fn test_vote_context_lists_every_player() {
        let mut words = IndexMap::new();
        words.insert("Alice".to_string(), "wave".to_string());
        words.insert("Bob".to_string(), "sand".to_string());

        let context = vote_context(&words, "ocean");
        assert!(context.contains("Alice: wave\nBob: sand"));
        assert!(context.contains("<target>player_name</target>"));
    }

    #[test]
    fn test_frame_mentions_language_and_name() {
        let prompt = frame("Carol", "a player", "Korean", "CONTEXT");
        assert!(prompt.starts_with("Hi, Carol. You are a player"));
        assert!(prompt.contains("write it in Korean"));
        assert!(prompt.contains("\n\nCONTEXT\n\n"));
    }

    #[test]
    fn test_topic_context_excludes_previous() {
        let context = topic_context("animals", &["cat".into(), "owl".into()]);
        assert!(context.contains("The genre is: animals"));
        assert!(context.ends_with("previously used topics: cat, owl"));
    }
}
