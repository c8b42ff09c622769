use std::cmp::Ordering;

#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    pub(crate) parent: Vec<usize>,
    pub(crate) size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }

        // Union by size.
        let (mut big, mut small) = (ra, rb);
        if self.size[big] < self.size[small] {
            std::mem::swap(&mut big, &mut small);
        }

        self.parent[small] = big;
        self.size[big] += self.size[small];
        big
    }
}

#[inline]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub(crate) fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length. Zero vectors are left as exact zeros.
pub(crate) fn normalize_in_place(v: &mut [f32]) {
    let n = norm(v);
    if n > 0.0 && n.is_finite() {
        for x in v {
            *x /= n;
        }
    } else {
        v.iter_mut().for_each(|x| *x = 0.0);
    }
}

pub(crate) fn normalized(v: &[f32]) -> Vec<f32> {
    let mut out = v.to_vec();
    normalize_in_place(&mut out);
    out
}

/// Cosine similarity; 0.0 when either side has zero norm.
#[inline]
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Exact k-nearest neighbors under cosine distance, self excluded.
///
/// Each row is ordered nearest first; equal distances resolve to the lower index,
/// so the result is fully deterministic.
pub(crate) fn knn_cosine(vectors: &[Vec<f32>], k: usize) -> Vec<Vec<usize>> {
    let n = vectors.len();
    let k = k.min(n.saturating_sub(1));
    if k == 0 {
        return vec![Vec::new(); n];
    }

    let norms: Vec<f32> = vectors.iter().map(|v| norm(v)).collect();
    let mut out = Vec::with_capacity(n);
    let mut row: Vec<(f32, usize)> = Vec::with_capacity(n - 1);

    for i in 0..n {
        row.clear();
        for j in 0..n {
            if j == i {
                continue;
            }
            let sim = if norms[i] == 0.0 || norms[j] == 0.0 {
                0.0
            } else {
                dot(&vectors[i], &vectors[j]) / (norms[i] * norms[j])
            };
            row.push((1.0 - sim, j));
        }

        let by_distance = |a: &(f32, usize), b: &(f32, usize)| -> Ordering {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        };
        if k < row.len() {
            row.select_nth_unstable_by(k - 1, by_distance);
            row.truncate(k);
        }
        row.sort_by(by_distance);
        out.push(row.iter().map(|&(_, j)| j).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knn_excludes_self_and_orders_by_distance() {
        let data = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.5, 0.5],
        ];
        let knn = knn_cosine(&data, 2);
        assert_eq!(knn.len(), 4);
        assert_eq!(knn[0], vec![1, 3]);
        assert!(knn.iter().enumerate().all(|(i, row)| !row.contains(&i)));
    }

    #[test]
    fn knn_clamps_k_to_population() {
        let data = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let knn = knn_cosine(&data, 10);
        assert_eq!(knn, vec![vec![1], vec![0]]);

        let single = vec![vec![1.0, 0.0]];
        assert_eq!(knn_cosine(&single, 3), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn knn_ties_resolve_to_lower_index() {
        let data = vec![vec![1.0, 0.0]; 5];
        let knn = knn_cosine(&data, 2);
        assert_eq!(knn[0], vec![1, 2]);
        assert_eq!(knn[3], vec![0, 1]);
    }

    #[test]
    fn normalize_zero_stays_zero() {
        let mut v = vec![0.0f32; 4];
        normalize_in_place(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));

        let v = normalized(&[3.0, 4.0]);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn union_find_merges_components() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        uf.union(2, 3);
        assert_eq!(uf.find(0), uf.find(1));
        assert_ne!(uf.find(1), uf.find(2));
        uf.union(1, 3);
        assert_eq!(uf.find(0), uf.find(2));
    }
}
