//! Authored fallback lines and generation prompts.

use super::{FlavorKey, FlavorSubject};
use crate::mapgen::mix_seed_stream;

const ITEM_LINES: &[&str] = &[
    "Scratches along the grip show it has changed hands many times.",
    "It is heavier than it looks and colder than it should be.",
    "A maker's mark has been filed away, leaving only a ragged notch.",
    "Faint runes catch the torchlight and fade when you look straight at them.",
    "Someone wrapped it carefully in oilcloth and never came back for it.",
    "It hums softly whenever the dungeon goes quiet.",
    "The finish is dull, but the edges are still true.",
    "Dried wax seals a crack that runs the length of it.",
];

const ENEMY_LINES: &[&str] = &[
    "It watches you without blinking.",
    "Old wounds have healed badly across its hide.",
    "It smells of wet stone and older things.",
    "Every movement it makes is patient and hungry.",
    "It has clearly claimed this stretch of tunnel.",
    "Something about its stillness makes the torch gutter.",
    "It tilts its head as if listening to the walls.",
    "It does not look like it has ever lost a fight down here.",
];

const ROOM_LINES: &[&str] = &[
    "Water beads on the ceiling and falls in slow, even drops.",
    "Soot marks the walls where a fire once burned for a long time.",
    "The floor dips towards the centre, worn by countless feet.",
    "A draft from nowhere carries the smell of iron.",
    "Broken shelving leans against one wall, long since emptied.",
    "Pale fungus traces the mortar lines in careful rows.",
    "Chain anchors jut from the stone at shoulder height.",
    "The echo here arrives a beat later than it should.",
];

const EPITAPH_LINES: &[&str] = &[
    "The dark took one more and did not notice.",
    "They went down for glory and stayed for good.",
    "Brave to the end, and now very quiet.",
    "The stairs kept going. They did not.",
    "Another torch burned out below the world.",
    "They were sure the next room would be empty.",
    "The dungeon keeps its own count.",
    "Rest here, where nothing else does.",
];

fn lines_for(subject: &FlavorSubject) -> &'static [&'static str] {
    match subject {
        FlavorSubject::Item(_) => ITEM_LINES,
        FlavorSubject::Enemy(_) => ENEMY_LINES,
        FlavorSubject::Room(_) => ROOM_LINES,
        FlavorSubject::Epitaph { .. } => EPITAPH_LINES,
    }
}

/// Deterministic authored text for `key`. The same key always yields the same line.
pub fn fallback_for(key: &FlavorKey) -> &'static str {
    let lines = lines_for(&key.subject);
    let stream = (u64::from(key.floor) << 32) | u64::from(key.index);
    let pick = mix_seed_stream(key.seed, stream) % lines.len() as u64;
    lines.get(pick as usize).copied().unwrap_or_default()
}

/// Prompt text for an external generator.
pub fn prompt_for(key: &FlavorKey) -> String {
    let floor = key.floor;
    match &key.subject {
        FlavorSubject::Item(name) => format!(
            "Write one atmospheric sentence, under 30 words and without quotation marks, \
             describing an item called '{name}' found on floor {floor} of a dungeon."
        ),
        FlavorSubject::Enemy(name) => format!(
            "Write one menacing sentence, under 30 words and without quotation marks, \
             describing a creature called '{name}' met on floor {floor} of a dungeon."
        ),
        FlavorSubject::Room(room_type) => format!(
            "Write one atmospheric sentence, under 30 words and without quotation marks, \
             describing a {room_type:?} room on floor {floor} of a dungeon."
        ),
        FlavorSubject::Epitaph { cause, level } => format!(
            "Write a one-sentence epitaph, under 25 words and without quotation marks, \
             for a level {level} adventurer killed by {cause} on floor {floor} of a dungeon."
        ),
    }
}
