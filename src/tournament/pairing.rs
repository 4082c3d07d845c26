// src/tournament/pairing.rs

use std::collections::HashSet;

use crate::domain::PlayerId;

/// Кандидат на спаривание: id подключения + имя (история пар ведётся по имени).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: PlayerId,
    pub name: String,
}

/// Решение подбора: кто белыми, кто чёрными.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pairing {
    pub white: Candidate,
    pub black: Candidate,
}

/// Один проход подбора пар.
///
/// Вход:
///   - `candidates`: свободные игроки, уже перемешанные вызывающим;
///   - `finished_as`: сколько завершённых партий было с (white, black)
///     именно в этих цветах;
///   - `games_per_pair`: лимит партий на пару.
///
/// Перебираем все пары i<j по порядку. Игрок, получивший пару, дальше
/// в этом проходе не участвует. Белыми играет тот, у кого в этой паре
/// было меньше белых; при равенстве белыми идёт второй из пары.
pub fn plan_pairings<F>(candidates: &[Candidate], finished_as: F, games_per_pair: u32) -> Vec<Pairing>
where
    F: Fn(&str, &str) -> u32,
{
    let mut taken: HashSet<PlayerId> = HashSet::new();
    let mut out = Vec::new();

    for (i, p1) in candidates.iter().enumerate() {
        for p2 in &candidates[i + 1..] {
            if taken.contains(&p1.id) || taken.contains(&p2.id) {
                continue;
            }

            let wb = finished_as(&p1.name, &p2.name);
            let bw = finished_as(&p2.name, &p1.name);
            if wb + bw >= games_per_pair {
                continue;
            }

            let (white, black) = if wb < bw { (p1, p2) } else { (p2, p1) };
            taken.insert(p1.id);
            taken.insert(p2.id);
            out.push(Pairing {
                white: white.clone(),
                black: black.clone(),
            });
        }
    }

    out
}
