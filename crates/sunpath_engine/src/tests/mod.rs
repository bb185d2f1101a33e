//! Whole-engine scenarios exercising the frame loop, the render graph and the
//! scene drivers together
