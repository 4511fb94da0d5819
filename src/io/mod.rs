// Copyright 2020 @TwoCookingMice

pub mod obj_utils;
