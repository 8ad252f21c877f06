// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod casts;
mod dispatch;
mod literals;
mod operators;
mod predicates;
mod references;
