/// evdev key codes that change how later keys are named.
const KEY_LEFTSHIFT: u16 = 42;
const KEY_RIGHTSHIFT: u16 = 54;
const KEY_CAPSLOCK: u16 = 58;

/// Map an evdev key code to the name a browser would report for it
/// (`KeyboardEvent.key`), given whether the letter/symbol is shifted.
///
/// NOTE: assumes a US QWERTY physical layout.
pub fn key_name(code: u16, shift: bool) -> Option<String> {
    if let Some((plain, shifted)) = printable(code) {
        let c = if shift { shifted } else { plain };
        return Some(c.to_string());
    }
    named(code).map(Into::into)
}

/// Printable keys as (unshifted, shifted).
fn printable(code: u16) -> Option<(char, char)> {
    let pair = match code {
        2 => ('1', '!'),
        3 => ('2', '@'),
        4 => ('3', '#'),
        5 => ('4', '$'),
        6 => ('5', '%'),
        7 => ('6', '^'),
        8 => ('7', '&'),
        9 => ('8', '*'),
        10 => ('9', '('),
        11 => ('0', ')'),
        12 => ('-', '_'),
        13 => ('=', '+'),
        26 => ('[', '{'),
        27 => (']', '}'),
        39 => (';', ':'),
        40 => ('\'', '"'),
        41 => ('`', '~'),
        43 => ('\\', '|'),
        51 => (',', '<'),
        52 => ('.', '>'),
        53 => ('/', '?'),
        57 => (' ', ' '),
        // Keypad: Shift does not change these (NumLock assumed on).
        55 => ('*', '*'),
        71 => ('7', '7'),
        72 => ('8', '8'),
        73 => ('9', '9'),
        74 => ('-', '-'),
        75 => ('4', '4'),
        76 => ('5', '5'),
        77 => ('6', '6'),
        78 => ('+', '+'),
        79 => ('1', '1'),
        80 => ('2', '2'),
        81 => ('3', '3'),
        82 => ('0', '0'),
        83 => ('.', '.'),
        98 => ('/', '/'),
        117 => ('=', '='),
        _ => {
            let c = letter(code)?;
            (c, c.to_ascii_uppercase())
        }
    };
    Some(pair)
}

fn letter(code: u16) -> Option<char> {
    let c = match code {
        16 => 'q',
        17 => 'w',
        18 => 'e',
        19 => 'r',
        20 => 't',
        21 => 'y',
        22 => 'u',
        23 => 'i',
        24 => 'o',
        25 => 'p',
        30 => 'a',
        31 => 's',
        32 => 'd',
        33 => 'f',
        34 => 'g',
        35 => 'h',
        36 => 'j',
        37 => 'k',
        38 => 'l',
        44 => 'z',
        45 => 'x',
        46 => 'c',
        47 => 'v',
        48 => 'b',
        49 => 'n',
        50 => 'm',
        _ => return None,
    };
    Some(c)
}

fn named(code: u16) -> Option<&'static str> {
    let name = match code {
        1 => "Escape",
        14 => "Backspace",
        15 => "Tab",
        28 | 96 => "Enter",
        29 | 97 => "Control",
        42 | 54 => "Shift",
        56 | 100 => "Alt",
        58 => "CapsLock",
        125 | 126 => "Meta",
        102 => "Home",
        103 => "ArrowUp",
        104 => "PageUp",
        105 => "ArrowLeft",
        106 => "ArrowRight",
        107 => "End",
        108 => "ArrowDown",
        109 => "PageDown",
        110 => "Insert",
        111 => "Delete",
        59 => "F1",
        60 => "F2",
        61 => "F3",
        62 => "F4",
        63 => "F5",
        64 => "F6",
        65 => "F7",
        66 => "F8",
        67 => "F9",
        68 => "F10",
        87 => "F11",
        88 => "F12",
        _ => return None,
    };
    Some(name)
}

/// Turns raw key events into browser-style key names, tracking Shift and
/// CapsLock across events.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    left_shift: bool,
    right_shift: bool,
    caps_lock: bool,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `value` follows evdev: 0 = release, 1 = press, 2 = autorepeat.
    /// Presses and repeats yield a key name (like `keydown`), releases never do.
    pub fn decode(&mut self, code: u16, value: i32) -> Option<String> {
        let down = value == 1 || value == 2;
        match code {
            KEY_LEFTSHIFT => self.left_shift = down,
            KEY_RIGHTSHIFT => self.right_shift = down,
            KEY_CAPSLOCK if value == 1 => self.caps_lock = !self.caps_lock,
            _ => {}
        }
        if !down {
            return None;
        }

        let shift = self.left_shift || self.right_shift;
        if letter(code).is_some() {
            return key_name(code, shift != self.caps_lock);
        }
        key_name(code, shift)
    }
}
