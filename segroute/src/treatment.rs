// SegRoute: Synthesizing ECMP and Label-Push Groups for Segment Routing
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Traffic Treatments
//!
//! A [`Treatment`] is the ordered list of actions applied to a packet by a single bucket of a
//! forwarding group. Two treatments are equal if and only if they contain the same instructions in
//! the same order. A [`Selector`] is metadata passed along with a next objective, which the device
//! driver may use to select the correct pipeline tables.

use crate::types::{MacAddress, NextId, PortNumber, SegmentId, VlanId};
use std::fmt;

/// Single action on a packet
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum Instruction {
    /// Set the source MAC address
    SetEthSrc(MacAddress),
    /// Set the destination MAC address
    SetEthDst(MacAddress),
    /// Remove the outermost VLAN tag
    PopVlan,
    /// Push a new (empty) MPLS header
    PushMpls,
    /// Copy the TTL from the IP header to the outermost MPLS header
    CopyTtlOut,
    /// Set the label of the outermost MPLS header
    SetMpls(SegmentId),
    /// Send the packet out of a port
    Output(PortNumber),
    /// Continue processing in another group
    Group(NextId),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::SetEthSrc(mac) => write!(f, "ETH_SRC:{}", mac),
            Instruction::SetEthDst(mac) => write!(f, "ETH_DST:{}", mac),
            Instruction::PopVlan => write!(f, "VLAN_POP"),
            Instruction::PushMpls => write!(f, "MPLS_PUSH"),
            Instruction::CopyTtlOut => write!(f, "TTL_OUT"),
            Instruction::SetMpls(label) => write!(f, "MPLS_LABEL:{}", label),
            Instruction::Output(port) => write!(f, "OUTPUT:{}", port),
            Instruction::Group(id) => write!(f, "GROUP:{}", id),
        }
    }
}

/// Ordered list of instructions. Use [`Treatment::builder`] to construct a new treatment.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Default)]
pub struct Treatment {
    instructions: Vec<Instruction>,
}

impl Treatment {
    /// Start building a new treatment
    pub fn builder() -> TreatmentBuilder {
        TreatmentBuilder::default()
    }

    /// Start a new builder containing all instructions of this treatment
    pub fn to_builder(&self) -> TreatmentBuilder {
        TreatmentBuilder { instructions: self.instructions.clone() }
    }

    /// Returns all instructions in order
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the output port of the treatment, if any.
    pub fn output_port(&self) -> Option<PortNumber> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::Output(p) => Some(*p),
            _ => None,
        })
    }

    /// Returns the label pushed (or set) by the treatment, if any.
    pub fn mpls_label(&self) -> Option<SegmentId> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::SetMpls(l) => Some(*l),
            _ => None,
        })
    }

    /// Returns the group the treatment chains to, if any.
    pub fn group(&self) -> Option<NextId> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::Group(g) => Some(*g),
            _ => None,
        })
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.instructions.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        )
    }
}

/// Builder for a [`Treatment`]
#[derive(Debug, Clone, Default)]
pub struct TreatmentBuilder {
    instructions: Vec<Instruction>,
}

impl TreatmentBuilder {
    /// Set the source MAC address
    pub fn set_eth_src(mut self, mac: MacAddress) -> Self {
        self.instructions.push(Instruction::SetEthSrc(mac));
        self
    }

    /// Set the destination MAC address
    pub fn set_eth_dst(mut self, mac: MacAddress) -> Self {
        self.instructions.push(Instruction::SetEthDst(mac));
        self
    }

    /// Pop the outermost VLAN tag
    pub fn pop_vlan(mut self) -> Self {
        self.instructions.push(Instruction::PopVlan);
        self
    }

    /// Push a new MPLS header
    pub fn push_mpls(mut self) -> Self {
        self.instructions.push(Instruction::PushMpls);
        self
    }

    /// Copy the TTL outwards
    pub fn copy_ttl_out(mut self) -> Self {
        self.instructions.push(Instruction::CopyTtlOut);
        self
    }

    /// Set the MPLS label
    pub fn set_mpls(mut self, label: SegmentId) -> Self {
        self.instructions.push(Instruction::SetMpls(label));
        self
    }

    /// Push an MPLS header carrying the given label. Shorthand for
    /// `push_mpls().copy_ttl_out().set_mpls(label)`.
    pub fn push_label(self, label: SegmentId) -> Self {
        self.push_mpls().copy_ttl_out().set_mpls(label)
    }

    /// Send the packet out of the port
    pub fn set_output(mut self, port: PortNumber) -> Self {
        self.instructions.push(Instruction::Output(port));
        self
    }

    /// Chain to the group
    pub fn group(mut self, id: NextId) -> Self {
        self.instructions.push(Instruction::Group(id));
        self
    }

    /// Finish the treatment
    pub fn build(self) -> Treatment {
        Treatment { instructions: self.instructions }
    }
}

/// Metadata passed along with a next objective.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
pub struct Selector {
    /// VLAN the traffic is classified into
    pub vlan: Option<VlanId>,
}

impl Selector {
    /// Metadata matching on a vlan
    pub fn vlan(vlan: VlanId) -> Self {
        Self { vlan: Some(vlan) }
    }
}
