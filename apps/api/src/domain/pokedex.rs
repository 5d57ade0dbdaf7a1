use crate::domain::team::value_objects::PokemonId;

const ARTWORK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

#[derive(Debug, Clone, Copy)]
enum Position {
    Before,
    After,
}

/// Extra Pokémon woven into the Gen-1 order, next to a reference entry.
/// Applied in order, so later inserts may reference earlier ones.
const EXTRA_INSERTS: [(u32, Position, u32); 8] = [
    (172, Position::Before, 25),
    (979, Position::After, 57),
    (242, Position::After, 113),
    (196, Position::After, 136),
    (197, Position::After, 196),
    (470, Position::After, 197),
    (471, Position::After, 470),
    (700, Position::After, 471),
];

/// Selectable roster in display order
pub fn roster() -> Vec<PokemonId> {
    let mut order: Vec<u32> = (1..=151).collect();
    for (id, position, reference) in EXTRA_INSERTS {
        let Some(idx) = order.iter().position(|n| *n == reference) else {
            continue;
        };
        let at = match position {
            Position::Before => idx,
            Position::After => idx + 1,
        };
        order.insert(at, id);
    }
    order
        .into_iter()
        .filter_map(|n| PokemonId::new(i64::from(n)))
        .collect()
}

/// Official artwork URL
pub fn artwork_url(id: PokemonId) -> String {
    format!("{}/{}.png", ARTWORK_BASE, id.get())
}

/// Dex label, zero-padded to three digits: `#025`
pub fn label(id: PokemonId) -> String {
    format!("#{:03}", id.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_of(roster: &[PokemonId], n: u32) -> usize {
        roster.iter().position(|p| p.get() == n).unwrap()
    }

    #[test]
    fn roster_has_gen1_plus_inserts() {
        let roster = roster();
        assert_eq!(roster.len(), 151 + EXTRA_INSERTS.len());
        assert_eq!(roster[0].get(), 1);
    }

    #[test]
    fn pichu_comes_before_pikachu() {
        let roster = roster();
        assert_eq!(position_of(&roster, 172) + 1, position_of(&roster, 25));
    }

    #[test]
    fn eevee_chain_follows_eevee_line() {
        let roster = roster();
        let chain: Vec<u32> = [136, 196, 197, 470, 471, 700]
            .iter()
            .map(|n| position_of(&roster, *n) as u32)
            .collect();
        assert!(chain.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn label_and_artwork() {
        let pikachu = PokemonId::new(25).unwrap();
        assert_eq!(label(pikachu), "#025");
        assert!(artwork_url(pikachu).ends_with("/official-artwork/25.png"));
        assert_eq!(label(PokemonId::new(979).unwrap()), "#979");
    }
}
