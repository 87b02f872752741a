//! Families answered by a fact rather than a computation: angle pairs,
//! coordinate quadrants, polygon sides.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{int_in, Draft};
use crate::distractor::DistractorContext;
use crate::skills::AnglePairKind;

const QUADRANTS: [&str; 4] = ["Quadrant I", "Quadrant II", "Quadrant III", "Quadrant IV"];

const POLYGONS: [(&str, i64); 8] = [
    ("triangle", 3),
    ("quadrilateral", 4),
    ("pentagon", 5),
    ("hexagon", 6),
    ("heptagon", 7),
    ("octagon", 8),
    ("nonagon", 9),
    ("decagon", 10),
];

pub(super) fn angle_pair<R: Rng + ?Sized>(rng: &mut R, pair: AnglePairKind) -> Option<Draft> {
    let total = pair.total();
    let angle = int_in(rng, 1, total / 5 - 1) * 5;
    let other = total - angle;
    let noun = pair.noun();
    // Mixing up complements and supplements.
    let confused = match pair {
        AnglePairKind::Complementary => 180 - angle,
        AnglePairKind::Supplementary => 90 - angle,
    };

    Some(Draft {
        question: format!("What is the {noun} of a {angle}° angle?"),
        answer: format!("{other}°"),
        explanation: format!(
            "{} angles add up to {total}°, so the {noun} is {total}° - {angle}° = {other}°.",
            match pair {
                AnglePairKind::Complementary => "Complementary",
                AnglePairKind::Supplementary => "Supplementary",
            }
        ),
        hints: vec![
            format!("The two angles together make {total}°."),
            format!("Subtract {angle}° from {total}°."),
        ],
        distractors: DistractorContext::default().with_mistakes([
            format!("{angle}°"),
            format!("{confused}°"),
            format!("{}°", 360 - angle),
        ]),
    })
}

fn quadrant_of(x: i64, y: i64) -> Option<&'static str> {
    match (x.signum(), y.signum()) {
        (1, 1) => Some(QUADRANTS[0]),
        (-1, 1) => Some(QUADRANTS[1]),
        (-1, -1) => Some(QUADRANTS[2]),
        (1, -1) => Some(QUADRANTS[3]),
        _ => None,
    }
}

pub(super) fn quadrant<R: Rng + ?Sized>(rng: &mut R, max_coordinate: i64) -> Option<Draft> {
    let x = int_in(rng, -max_coordinate, max_coordinate);
    let y = int_in(rng, -max_coordinate, max_coordinate);
    // Points on an axis belong to no quadrant.
    let answer = quadrant_of(x, y)?;
    let side = |v: i64, pos: &str, neg: &str| if v > 0 { pos.to_string() } else { neg.to_string() };

    Some(Draft {
        question: format!("In which quadrant is the point ({x}, {y})?"),
        answer: answer.to_string(),
        explanation: format!(
            "x = {x} is {} and y = {y} is {}, which places the point in {answer}.",
            side(x, "positive", "negative"),
            side(y, "positive", "negative"),
        ),
        hints: vec![
            "Look at the sign of each coordinate.".into(),
            "Quadrants are numbered counterclockwise from the upper right.".into(),
        ],
        distractors: DistractorContext::default().with_pool(QUADRANTS),
    })
}

pub(super) fn shape_sides<R: Rng + ?Sized>(rng: &mut R) -> Option<Draft> {
    let index = rng.gen_range(0..POLYGONS.len());
    let (name, sides) = POLYGONS[index];
    let article = if name.starts_with(['a', 'e', 'i', 'o', 'u']) { "an" } else { "a" };

    if rng.gen_bool(0.5) {
        Some(Draft {
            question: format!("How many sides does {article} {name} have?"),
            answer: sides.to_string(),
            explanation: format!("{} {name} is a polygon with {sides} sides.", capitalize(article)),
            hints: vec![
                format!("Count the straight edges of {article} {name}."),
                "The prefix of the name tells you the number.".into(),
            ],
            distractors: DistractorContext::default().with_mistakes([sides + 1, sides - 1]),
        })
    } else {
        let mut pool: Vec<&str> = POLYGONS.iter().map(|(n, _)| *n).collect();
        pool.shuffle(rng);
        // Neighbouring polygons are the easiest to confuse.
        let neighbours: Vec<&str> = [index.checked_sub(1), Some(index + 1)]
            .into_iter()
            .flatten()
            .filter_map(|i| POLYGONS.get(i).map(|(n, _)| *n))
            .collect();
        Some(Draft {
            question: format!("What is the name of a polygon with {sides} sides?"),
            answer: name.to_string(),
            explanation: format!("A polygon with {sides} sides is called {article} {name}."),
            hints: vec![
                format!("Count off the sides: the shape has {sides}."),
                "Think of the Greek number prefixes.".into(),
            ],
            distractors: DistractorContext::default()
                .with_mistakes(neighbours)
                .with_pool(pool),
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
