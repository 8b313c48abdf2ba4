//! Splits an owned `Vec<T>` into `(start_index, chunk)` pairs, preserving
//! enough bookkeeping for the executors to reassemble results in order.

pub(crate) fn chunk_indexed<T>(items: Vec<T>, chunksize: usize) -> Vec<(usize, Vec<T>)> {
    let chunksize = chunksize.max(1);
    let mut out = Vec::new();
    let mut iter = items.into_iter();
    let mut start = 0;
    loop {
        let chunk: Vec<T> = (&mut iter).take(chunksize).collect();
        if chunk.is_empty() {
            break;
        }
        let len = chunk.len();
        out.push((start, chunk));
        start += len;
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn chunks_cover_every_item_exactly_once_in_order() {
        let chunks = chunk_indexed((0..10).collect(), 3);
        let mut flat = Vec::new();
        for (start, chunk) in &chunks {
            assert_eq!(*start, flat.len());
            flat.extend(chunk.iter().copied());
        }
        assert_eq!(flat, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks: Vec<(usize, Vec<u32>)> = chunk_indexed(vec![], 4);
        assert!(chunks.is_empty());
    }
}
