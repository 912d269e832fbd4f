//! Lexical signal extractor: mood / energy / anxiety cues, triggers, emotion
//!
//! Cue lists are Turkish first with a small English set. Sentiment is read
//! from the recency window only (text after the last contrast marker, capped
//! to the last N words). Triggers are read from the whole chunk.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::LexiconConfig;
use crate::types::{ChunkSignal, Emotion, Trigger};
use crate::{RECENCY_WINDOW_WORDS, SCORE_HALF_RANGE};

// Cue weights
const W_STRONG: f64 = 3.0;
const W_POSITIVE: f64 = 2.5;
const W_NEGATIVE: f64 = 2.0;
const W_NEGATED: f64 = 2.5;
const W_ENERGY: f64 = 2.0;
const W_ANXIETY_UP: f64 = 2.5;
const W_ANXIETY_DOWN: f64 = 2.0;
const W_ANGER_MOOD: f64 = 1.5;
const W_ANGER_ENERGY: f64 = 1.0;

/// Per intensifier, capped at two
const INTENSIFIER_STEP: f64 = 0.25;

/// Total cue weight at which signal strength reaches ~63%
const SIGNAL_SCALE: f64 = 3.0;

lazy_static! {
    // =========================================================================
    // Mood
    // =========================================================================
    static ref RE_MOOD_POS_STRONG: Regex = Regex::new(
        r"\b(?:mutlu\w*|harika\w*|muhteşem\w*|süper|şahane\w*|sevinçli\w*|keyifli\w*|happy|great|wonderful|amazing)\b"
    ).unwrap();

    static ref RE_MOOD_POS: Regex = Regex::new(
        r"\b(?:iyi\w*|güzel\w*|rahatla\w*|huzurlu\w*|ferah\w*|memnun\w*|neşe\w*|umutlu\w*|sevindi\w*|good|fine|better|relieved|glad)\b"
    ).unwrap();

    static ref RE_MOOD_NEG_STRONG: Regex = Regex::new(
        r"\b(?:kötü\w*|berbat\w*|rezil\w*|mahvol\w*|perişan\w*|çaresiz\w*|mutsuz\w*|depresif\w*|terrible|awful|miserable|depressed)\b"
    ).unwrap();

    static ref RE_MOOD_NEG: Regex = Regex::new(
        r"\b(?:üzgün\w*|üzül\w*|kırgın\w*|moral\w* bozuk\w*|yalnız\w*|ağla\w*|sıkıl\w*|hüzün\w*|sad|down|lonely|upset|bad)\b"
    ).unwrap();

    /// Positive cue cancelled by a negator: counted negative, removed from positives
    static ref RE_NEGATED_POS: Regex = Regex::new(
        r"\b(?:iyi|mutlu|güzel|rahat|huzurlu|keyifli)\w*\s+değil\w*|\bnot\s+(?:feeling\s+)?(?:good|happy|fine|great|okay|ok)\b"
    ).unwrap();

    // =========================================================================
    // Energy
    // =========================================================================
    static ref RE_ENERGY_HIGH: Regex = Regex::new(
        r"\b(?:enerjik\w*|dinç\w*|zinde\w*|heyecan\w*|coşku\w*|hareketli\w*|canlı\w*|energetic|excited|pumped)\b"
    ).unwrap();

    static ref RE_ENERGY_LOW: Regex = Regex::new(
        r"\b(?:yorgun\w*|bitkin\w*|halsiz\w*|uykulu\w*|tüken\w*|güçsüz\w*|takatsiz\w*|tired|exhausted|drained|sleepy)\b"
    ).unwrap();

    // =========================================================================
    // Anxiety
    // =========================================================================
    static ref RE_ANXIETY_UP: Regex = Regex::new(
        r"\b(?:endişe\w*|kaygı\w*|gergin\w*|panik\w*|kork\w*|stres\w*|huzursuz\w*|tedirgin\w*|anksiyete\w*|anxious|worried|nervous|panic\w*|scared|stressed)\b"
    ).unwrap();

    static ref RE_ANXIETY_DOWN: Regex = Regex::new(
        r"\b(?:rahatla\w*|sakin\w*|huzurlu\w*|ferahla\w*|gevşe\w*|calm|relaxed|relieved)\b"
    ).unwrap();

    // =========================================================================
    // Anger (emotion category; nudges mood down and energy up)
    // =========================================================================
    static ref RE_ANGER: Regex = Regex::new(
        r"\b(?:sinir\w*|öfke\w*|kızgın\w*|kızdım|kızıyorum|angry|furious|mad)\b"
    ).unwrap();

    // =========================================================================
    // Discourse
    // =========================================================================
    static ref RE_INTENSIFIER: Regex = Regex::new(
        r"\b(?:çok|aşırı|son derece|gerçekten|epey|very|really|extremely|so)\b"
    ).unwrap();

    static ref RE_CONTRAST: Regex = Regex::new(
        r"\b(?:ama|fakat|ancak|lakin|yine de|oysa|halbuki|aniden|birden|ne var ki|but|however|suddenly|though)\b"
    ).unwrap();

    // =========================================================================
    // Triggers
    // =========================================================================
    static ref TRIGGERS: Vec<(Trigger, Regex)> = vec![
        (Trigger::Work, Regex::new(
            r"\b(?:iş(?:e|te|im|imde|ten|ler\w*|yeri\w*)?|patron\w*|toplantı\w*|ofis\w*|proje\w*|mesai\w*|müdür\w*|work|job|boss|meeting|office|deadline)\b"
        ).unwrap()),
        (Trigger::Relationship, Regex::new(
            r"\b(?:sevgili\w*|eşim\w*|kocam\w*|karım\w*|partner\w*|ayrıl\w*|kavga\w*|boşan\w*|relationship|boyfriend|girlfriend|husband|wife|breakup)\b"
        ).unwrap()),
        (Trigger::Health, Regex::new(
            r"\b(?:hasta\w*|ağrı\w*|doktor\w*|ilaç\w*|migren\w*|sick|pain|doctor|headache|medication)\b"
        ).unwrap()),
        (Trigger::Financial, Regex::new(
            r"\b(?:para\w*|borç\w*|maaş\w*|kira\w*|fatura\w*|kredi\w*|money|debt|rent|salary|bills?)\b"
        ).unwrap()),
        (Trigger::Sleep, Regex::new(
            r"\b(?:uyku\w*|uyuya\w*|uyuyam\w*|uyan\w*|kabus\w*|insomnia|sleep\w*|nightmares?)\b"
        ).unwrap()),
        (Trigger::Exercise, Regex::new(
            r"\b(?:spor\w*|koşu\w*|koştum|yürüyüş\w*|egzersiz\w*|antrenman\w*|yoga|gym|workout|exercise|running)\b"
        ).unwrap()),
        (Trigger::Social, Regex::new(
            r"\b(?:arkadaş\w*|parti\w*|kalabalık\w*|aile\w*|misafir\w*|friends?|party|family|crowd)\b"
        ).unwrap()),
    ];
}

/// Lowercase folds of a text. The Turkish fold (`I` to `ı`, `İ` to `i`) comes
/// first; the plain fold (`I` to `i`) follows only when the text has an ASCII
/// `I`, since English cues need it. Both folds keep the same word boundaries.
pub(crate) fn folds(text: &str) -> Vec<String> {
    let turkish = fold(text, 'ı');
    if !text.contains('I') {
        return vec![turkish];
    }
    vec![turkish, fold(text, 'i')]
}

fn fold(text: &str, capital_i: char) -> String {
    text.chars()
        .map(|c| match c {
            'İ' => 'i',
            'I' => capital_i,
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Raw cue counts over one recency window
#[derive(Debug, Clone, Copy, Default)]
struct CueCounts {
    negated: f64,
    pos_strong: f64,
    pos: f64,
    neg_strong: f64,
    neg: f64,
    energy_high: f64,
    energy_low: f64,
    anxiety_up: f64,
    anxiety_down: f64,
    anger: f64,
    intensifiers: f64,
}

impl CueCounts {
    fn scan(window: &str) -> Self {
        // Negated positives are scored first, then blanked out
        let negated = count(&RE_NEGATED_POS, window);
        let window = RE_NEGATED_POS.replace_all(window, " ");
        Self {
            negated,
            pos_strong: count(&RE_MOOD_POS_STRONG, &window),
            pos: count(&RE_MOOD_POS, &window),
            neg_strong: count(&RE_MOOD_NEG_STRONG, &window),
            neg: count(&RE_MOOD_NEG, &window),
            energy_high: count(&RE_ENERGY_HIGH, &window),
            energy_low: count(&RE_ENERGY_LOW, &window),
            anxiety_up: count(&RE_ANXIETY_UP, &window),
            anxiety_down: count(&RE_ANXIETY_DOWN, &window),
            anger: count(&RE_ANGER, &window),
            intensifiers: count(&RE_INTENSIFIER, &window),
        }
    }

    fn hits(&self) -> usize {
        (self.pos_strong + self.pos + self.neg_strong + self.neg + self.negated
            + self.energy_high + self.energy_low + self.anxiety_up + self.anxiety_down + self.anger)
            as usize
    }
}

/// Lexical signal extractor. Stateless; safe to share.
#[derive(Debug, Clone)]
pub struct LexicalExtractor {
    recency_window_words: usize,
}

impl Default for LexicalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalExtractor {
    pub fn new() -> Self {
        Self {
            recency_window_words: RECENCY_WINDOW_WORDS,
        }
    }

    pub fn with_config(config: &LexiconConfig) -> Self {
        Self {
            recency_window_words: config.recency_window_words.max(1),
        }
    }

    /// Trailing clause after the last contrast marker, capped to the last N words.
    /// Input must already be folded to lowercase.
    pub fn recency_window(&self, normalized: &str) -> String {
        let tail = match RE_CONTRAST.find_iter(normalized).last() {
            Some(m) if !normalized[m.end()..].trim().is_empty() => &normalized[m.end()..],
            _ => normalized,
        };
        let words: Vec<&str> = tail.split_whitespace().collect();
        let start = words.len().saturating_sub(self.recency_window_words);
        words[start..].join(" ")
    }

    /// Score one chunk of text
    pub fn analyze_chunk(&self, text: &str) -> ChunkSignal {
        let folded = folds(text.trim());
        if folded[0].is_empty() {
            return ChunkSignal::zero(0, 0.0);
        }

        let triggers: Vec<Trigger> = TRIGGERS
            .iter()
            .filter(|(_, re)| folded.iter().any(|f| re.is_match(f)))
            .map(|(t, _)| *t)
            .collect();

        // The fold that reads more cues wins; ties keep the Turkish fold
        let mut word_count = 0;
        let mut cues = CueCounts::default();
        for (i, f) in folded.iter().enumerate() {
            let window = self.recency_window(f);
            let scanned = CueCounts::scan(&window);
            if i == 0 || scanned.hits() > cues.hits() {
                word_count = window.split_whitespace().count();
                cues = scanned;
            }
        }

        let hits = cues.hits();
        if hits == 0 {
            let confidence = 0.1 * (word_count as f64 / 8.0).min(1.0);
            let mut signal = ChunkSignal::zero(word_count, confidence);
            signal.triggers = triggers;
            return signal;
        }

        let CueCounts {
            negated,
            pos_strong,
            pos,
            neg_strong,
            neg,
            energy_high,
            energy_low,
            anxiety_up,
            anxiety_down,
            anger,
            intensifiers,
        } = cues;
        let intensity = 1.0 + INTENSIFIER_STEP * intensifiers.min(2.0);

        let happy = pos_strong * W_STRONG + pos * W_POSITIVE;
        let sad = neg_strong * W_STRONG + neg * W_NEGATIVE + negated * W_NEGATED;
        let angry = anger * W_ANGER_MOOD;
        let excited = energy_high * W_ENERGY;
        let tired = energy_low * W_ENERGY;
        let anxious = anxiety_up * W_ANXIETY_UP;
        let calm = anxiety_down * W_ANXIETY_DOWN;

        let mood_delta = clamp_delta((happy - sad - angry) * intensity);
        let energy_delta = clamp_delta((excited - tired + anger * W_ANGER_ENERGY) * intensity);
        let anxiety_delta = clamp_delta((anxious - calm) * intensity);

        let total_weight = (happy + sad + angry + excited + tired + anxious + calm) * intensity;
        let signal_strength = 1.0 - (-total_weight / SIGNAL_SCALE).exp();

        let length_factor = (0.6 + 0.05 * word_count as f64).min(1.0);
        let confidence = ((0.3 + 0.15 * hits as f64).min(0.95) * length_factor).clamp(0.0, 1.0);

        let emotion = dominant_emotion(&[
            (Emotion::Happy, happy),
            (Emotion::Sad, sad),
            (Emotion::Anxious, anxious),
            (Emotion::Angry, angry),
            (Emotion::Calm, calm),
            (Emotion::Tired, tired),
            (Emotion::Excited, excited),
        ]);

        ChunkSignal {
            mood_delta,
            energy_delta,
            anxiety_delta,
            triggers,
            emotion,
            signal_strength: signal_strength.clamp(0.0, 1.0),
            confidence,
            cue_hits: hits,
            word_count,
        }
    }
}

/// Score one chunk with the default extractor
pub fn analyze_chunk(text: &str) -> ChunkSignal {
    LexicalExtractor::new().analyze_chunk(text)
}

fn count(regex: &Regex, text: &str) -> f64 {
    regex.find_iter(text).count() as f64
}

fn clamp_delta(delta: f64) -> f64 {
    delta.clamp(-SCORE_HALF_RANGE, SCORE_HALF_RANGE)
}

/// Highest-scoring category; earlier entries win ties; all-zero is neutral
fn dominant_emotion(scores: &[(Emotion, f64)]) -> Emotion {
    let mut best = (Emotion::Neutral, 0.0);
    for &(emotion, score) in scores {
        if score > best.1 {
            best = (emotion, score);
        }
    }
    best.0
}

// =============================================================================
// TESTS
// =============================================================================
