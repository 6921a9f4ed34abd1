// src/tokenizer/parallelism.rs

//! Iterators that run on rayon or serially depending on a runtime flag,
//! so the same pipeline code serves both single- and multi-worker runs.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon_cond::CondIterator;

pub trait MaybeParallelIterator<P, S>
where
    P: ParallelIterator,
    S: Iterator<Item = P::Item>,
{
    fn into_maybe_par_iter(self, parallel: bool) -> CondIterator<P, S>;
}

impl<P, S, I> MaybeParallelIterator<P, S> for I
where
    I: IntoParallelIterator<Iter = P, Item = P::Item> + IntoIterator<IntoIter = S, Item = S::Item>,
    P: ParallelIterator,
    S: Iterator<Item = P::Item>,
{
    fn into_maybe_par_iter(self, parallel: bool) -> CondIterator<P, S> {
        if parallel {
            CondIterator::from_parallel(self)
        } else {
            CondIterator::from_serial(self)
        }
    }
}

pub trait MaybeParallelRefIterator<'data, P, S>
where
    P: ParallelIterator,
    S: Iterator<Item = P::Item>,
    P::Item: 'data,
{
    fn maybe_par_iter(&'data self, parallel: bool) -> CondIterator<P, S>;
}

impl<'data, P, S, I: 'data + ?Sized> MaybeParallelRefIterator<'data, P, S> for I
where
    &'data I: MaybeParallelIterator<P, S>,
    P: ParallelIterator,
    S: Iterator<Item = P::Item>,
    P::Item: 'data,
{
    fn maybe_par_iter(&'data self, parallel: bool) -> CondIterator<P, S> {
        self.into_maybe_par_iter(parallel)
    }
}
