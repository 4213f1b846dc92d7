//! Poker hands dealt to PokerHand tokens
//!
//! Each token receives five distinct cards from a standard 52-card deck. The deal is a
//! partial Fisher-Yates shuffle driven by `keccak256(token_id || minter || round)`, so
//! the same token minted by the same account always shows the same hand.

use std::fmt;

use alloy::primitives::{Address, U256, keccak256};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::metadata::TokenMetadata;

pub const HAND_SIZE: usize = 5;
const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    fn symbol(self) -> char {
        match self {
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
            Suit::Hearts => '♥',
            Suit::Spades => '♠',
        }
    }

    fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }
}

/// Card rank, 2 through 14 (ace high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(u8);

impl Rank {
    pub const ACE: Rank = Rank(14);

    pub fn new(value: u8) -> Option<Self> {
        (2..=14).contains(&value).then_some(Rank(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    fn label(self) -> &'static str {
        const LABELS: [&str; 13] = [
            "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A",
        ];
        LABELS[(self.0 - 2) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    /// Card at position `index` of an unshuffled deck, suits grouped.
    fn from_index(index: usize) -> Self {
        Card {
            rank: Rank((index % 13) as u8 + 2),
            suit: Suit::ALL[index / 13],
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.symbol())
    }
}

/// Hand categories in ascending strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandRank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
            HandRank::RoyalFlush => "Royal Flush",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    cards: [Card; HAND_SIZE],
}

impl Hand {
    pub fn new(cards: [Card; HAND_SIZE]) -> Self {
        Self { cards }
    }

    /// Deal the hand for `token_id` minted by `minter`.
    pub fn deal(token_id: U256, minter: Address) -> Self {
        let mut seed = [0u8; 32 + 20];
        seed[..32].copy_from_slice(&token_id.to_be_bytes::<32>());
        seed[32..].copy_from_slice(minter.as_slice());

        let mut deck: [usize; DECK_SIZE] = std::array::from_fn(|i| i);
        for round in 0..HAND_SIZE {
            let mut input = seed.to_vec();
            input.push(round as u8);
            let digest = keccak256(&input);
            let draw = u64::from_be_bytes(std::array::from_fn(|i| digest[i]));
            let pick = round + (draw % (DECK_SIZE - round) as u64) as usize;
            deck.swap(round, pick);
        }

        Self::new(std::array::from_fn(|i| Card::from_index(deck[i])))
    }

    pub fn cards(&self) -> &[Card; HAND_SIZE] {
        &self.cards
    }

    pub fn rank(&self) -> HandRank {
        let mut values: Vec<u8> = self.cards.iter().map(|c| c.rank.value()).collect();
        values.sort_unstable_by(|a, b| b.cmp(a));

        let flush = self.cards.iter().all(|c| c.suit == self.cards[0].suit);
        let distinct = values.windows(2).all(|w| w[0] != w[1]);
        let wheel = values == [14, 5, 4, 3, 2];
        let straight = distinct && (values[0] - values[4] == 4 || wheel);

        // group sizes, largest first
        let mut groups: Vec<usize> = Vec::with_capacity(HAND_SIZE);
        for chunk in values.chunk_by(|a, b| a == b) {
            groups.push(chunk.len());
        }
        groups.sort_unstable_by(|a, b| b.cmp(a));

        match (straight, flush, groups.as_slice()) {
            (true, true, _) if values[0] == Rank::ACE.value() && !wheel => HandRank::RoyalFlush,
            (true, true, _) => HandRank::StraightFlush,
            (_, _, [4, ..]) => HandRank::FourOfAKind,
            (_, _, [3, 2]) => HandRank::FullHouse,
            (_, true, _) => HandRank::Flush,
            (true, _, _) => HandRank::Straight,
            (_, _, [3, ..]) => HandRank::ThreeOfAKind,
            (_, _, [2, 2, ..]) => HandRank::TwoPair,
            (_, _, [2, ..]) => HandRank::OnePair,
            _ => HandRank::HighCard,
        }
    }

    /// Five card entries followed by the hand category.
    pub fn attributes(&self) -> Vec<Value> {
        let mut attributes: Vec<Value> = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| json!({ "trait_type": format!("Card {}", i + 1), "value": card.to_string() }))
            .collect();
        attributes.push(json!({ "trait_type": "Hand", "value": self.rank().to_string() }));
        attributes
    }

    pub fn svg(&self) -> String {
        let mut svg = String::from(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 350 120"><rect width="100%" height="100%" fill="#0b6623"/>"##,
        );
        for (i, card) in self.cards.iter().enumerate() {
            let x = 10 + i * 68;
            let color = if card.suit.is_red() { "#c00" } else { "#000" };
            svg.push_str(&format!(
                r##"<rect x="{x}" y="20" width="60" height="80" rx="6" fill="#fff"/><text x="{}" y="68" font-size="22" text-anchor="middle" fill="{color}">{card}</text>"##,
                x + 30
            ));
        }
        svg.push_str(&format!(
            r##"<text x="175" y="114" font-size="12" text-anchor="middle" fill="#fff">{}</text></svg>"##,
            self.rank()
        ));
        svg
    }

    pub fn image_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(self.svg()))
    }

    pub fn metadata(&self, token_id: U256) -> TokenMetadata {
        TokenMetadata {
            name: format!("PokerHand #{token_id}"),
            description: format!("A five card poker hand: {}.", self.rank()),
            image: self.image_uri(),
            attributes: self.attributes(),
        }
    }
}
