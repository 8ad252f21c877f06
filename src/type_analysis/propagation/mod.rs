// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
mod expressions;
mod pipeline;
mod statements;

pub use pipeline::{LazyCopy, OptionsError, TypeResolver, TypeResolverOptions};
