//! RC4 stream cipher used by security handler revisions 2 to 4

/// RC4 cipher state
pub struct Rc4 {
    /// State array
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Key scheduling. An empty key is treated as a single zero byte.
    pub fn new(key: &[u8]) -> Self {
        let key: &[u8] = if key.is_empty() { &[0] } else { key };
        let mut s = [0u8; 256];
        for (i, byte) in s.iter_mut().enumerate() {
            *byte = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }

        Self { s, i: 0, j: 0 }
    }

    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let index = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[index as usize]
    }

    /// XOR the keystream into `data` (encryption and decryption are the same)
    pub fn process_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte ^= self.next_byte();
        }
    }

    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = data.to_vec();
        self.process_in_place(&mut output);
        output
    }
}

/// One-shot RC4 with a fresh key schedule
pub fn rc4_transform(key: &[u8], data: &[u8]) -> Vec<u8> {
    Rc4::new(key).process(data)
}

/// The 19 extra RC4 passes of revisions 3 and 4, keyed by `key XOR round`.
///
/// `reverse` runs rounds 19 down to 0, which undoes a forward application
/// of rounds 0 to 19.
pub(crate) fn rc4_rounds(key: &[u8], data: &[u8], reverse: bool) -> Vec<u8> {
    let rounds: Vec<u8> = if reverse {
        (0..=19).rev().collect()
    } else {
        (0..=19).collect()
    };

    let mut result = data.to_vec();
    for round in rounds {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        result = rc4_transform(&round_key, &result);
    }
    result
}
