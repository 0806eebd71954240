//! Fixed US-QWERTY key positions used to bucket typing errors.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum KeyRow {
    #[strum(serialize = "top")]
    Top,
    #[strum(serialize = "home")]
    Home,
    #[strum(serialize = "bottom")]
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Hand {
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "right")]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Finger {
    #[strum(serialize = "left pinky")]
    LeftPinky,
    #[strum(serialize = "left ring")]
    LeftRing,
    #[strum(serialize = "left middle")]
    LeftMiddle,
    #[strum(serialize = "left index")]
    LeftIndex,
    #[strum(serialize = "right index")]
    RightIndex,
    #[strum(serialize = "right middle")]
    RightMiddle,
    #[strum(serialize = "right ring")]
    RightRing,
    #[strum(serialize = "right pinky")]
    RightPinky,
    #[strum(serialize = "thumbs")]
    Thumbs,
}

pub const ROWS: [KeyRow; 3] = [KeyRow::Top, KeyRow::Home, KeyRow::Bottom];
pub const HANDS: [Hand; 2] = [Hand::Left, Hand::Right];
pub const FINGERS: [Finger; 9] = [
    Finger::LeftPinky,
    Finger::LeftRing,
    Finger::LeftMiddle,
    Finger::LeftIndex,
    Finger::RightIndex,
    Finger::RightMiddle,
    Finger::RightRing,
    Finger::RightPinky,
    Finger::Thumbs,
];

impl Finger {
    /// Thumbs share the space bar and belong to neither hand
    pub fn hand(&self) -> Option<Hand> {
        match self {
            Finger::LeftPinky | Finger::LeftRing | Finger::LeftMiddle | Finger::LeftIndex => {
                Some(Hand::Left)
            }
            Finger::RightIndex | Finger::RightMiddle | Finger::RightRing | Finger::RightPinky => {
                Some(Hand::Right)
            }
            Finger::Thumbs => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    /// `None` for the number row and the space bar
    pub row: Option<KeyRow>,
    pub finger: Finger,
}

impl KeyPosition {
    pub fn hand(&self) -> Option<Hand> {
        self.finger.hand()
    }
}

use Finger::*;
use KeyRow::*;

const LAYOUT: &[(char, Option<KeyRow>, Finger)] = &[
    ('`', None, LeftPinky),
    ('1', None, LeftPinky),
    ('2', None, LeftRing),
    ('3', None, LeftMiddle),
    ('4', None, LeftIndex),
    ('5', None, LeftIndex),
    ('6', None, RightIndex),
    ('7', None, RightIndex),
    ('8', None, RightMiddle),
    ('9', None, RightRing),
    ('0', None, RightPinky),
    ('-', None, RightPinky),
    ('=', None, RightPinky),
    ('\t', Some(Top), LeftPinky),
    ('q', Some(Top), LeftPinky),
    ('w', Some(Top), LeftRing),
    ('e', Some(Top), LeftMiddle),
    ('r', Some(Top), LeftIndex),
    ('t', Some(Top), LeftIndex),
    ('y', Some(Top), RightIndex),
    ('u', Some(Top), RightIndex),
    ('i', Some(Top), RightMiddle),
    ('o', Some(Top), RightRing),
    ('p', Some(Top), RightPinky),
    ('[', Some(Top), RightPinky),
    (']', Some(Top), RightPinky),
    ('\\', Some(Top), RightPinky),
    ('a', Some(Home), LeftPinky),
    ('s', Some(Home), LeftRing),
    ('d', Some(Home), LeftMiddle),
    ('f', Some(Home), LeftIndex),
    ('g', Some(Home), LeftIndex),
    ('h', Some(Home), RightIndex),
    ('j', Some(Home), RightIndex),
    ('k', Some(Home), RightMiddle),
    ('l', Some(Home), RightRing),
    (';', Some(Home), RightPinky),
    ('\'', Some(Home), RightPinky),
    ('\n', Some(Home), RightPinky),
    ('z', Some(Bottom), LeftPinky),
    ('x', Some(Bottom), LeftRing),
    ('c', Some(Bottom), LeftMiddle),
    ('v', Some(Bottom), LeftIndex),
    ('b', Some(Bottom), LeftIndex),
    ('n', Some(Bottom), RightIndex),
    ('m', Some(Bottom), RightIndex),
    (',', Some(Bottom), RightMiddle),
    ('.', Some(Bottom), RightRing),
    ('/', Some(Bottom), RightPinky),
    (' ', None, Thumbs),
];

/// Maps a character to the unshifted key that produces it
pub fn base_key(c: char) -> char {
    match c {
        '~' => '`',
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '_' => '-',
        '+' => '=',
        '{' => '[',
        '}' => ']',
        '|' => '\\',
        ':' => ';',
        '"' => '\'',
        '<' => ',',
        '>' => '.',
        '?' => '/',
        '\r' => '\n',
        other => other.to_lowercase().next().unwrap_or(other),
    }
}

/// Key position for a character, if it lives on the layout
pub fn locate(c: char) -> Option<KeyPosition> {
    let key = base_key(c);
    LAYOUT
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, row, finger)| KeyPosition {
            row: *row,
            finger: *finger,
        })
}
